use crate::error::RefinerError;
use crate::startup::{STARTUP_ERROR_MESSAGE, startup_failure_text};

use common::ErrorLocation;

/// **VALUE**: The dialog leads with the fixed message and then the cause.
#[test]
fn given_startup_error_when_building_dialog_text_then_message_then_detail() {
    let err = RefinerError::Core {
        message: String::from("Backend interpreter 'python3' not found"),
        location: ErrorLocation::here(),
    };

    let text = startup_failure_text(&err);

    assert!(text.starts_with(STARTUP_ERROR_MESSAGE));
    assert!(text.ends_with(&err.to_string()));
}
