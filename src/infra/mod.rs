pub mod http_client;
pub mod static_session;
pub mod webdriver_session;
