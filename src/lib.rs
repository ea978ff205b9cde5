pub mod app;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod state;
pub mod storage;
pub mod ui;
pub mod user;

pub use app::router;
pub use codec::{collect, collect_at, restore, ControlSink, RawInputProvider, Record};
pub use config::Settings;
pub use schema::{FieldDescriptor, FieldKind, FieldSchema, FieldValue, RawValue};
pub use state::AppState;
pub use storage::{load_schema, load_user_state};
