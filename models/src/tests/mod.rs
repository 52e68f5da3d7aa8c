mod backend_info;
mod server_state;
