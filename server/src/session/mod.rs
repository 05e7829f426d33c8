pub mod ui_session;
