mod process;
mod readiness;
