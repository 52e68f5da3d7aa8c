mod handle;
mod layout;
mod spawn;
