mod mock;
mod smtp;
mod timeouts;
