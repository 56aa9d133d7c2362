pub mod sheets_api;

pub use sheets_api::SheetsApi;
