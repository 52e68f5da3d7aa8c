mod backend;
mod port;
