//! Domain layer - query state, paging, schemas, permissions and menus

pub mod control;
pub mod field;
pub mod flatten;
pub mod highlight;
pub mod lang;
pub mod menu;
pub mod paginator;
pub mod permission;
pub mod query;
pub mod selection;

pub use control::{Control, ControlKind, ControlRegistry, Form};
pub use field::{Field, FieldBound, FieldDef, FieldType, Schema, SchemaEntry};
pub use menu::{MenuAdapter, MenuItem};
pub use paginator::{paginate, PageInput, Pagination};
pub use permission::{Action, PermissionMap, PermissionSource, Session, Wanted};
pub use query::{ListParams, QueryState, QueryValue, WireParams};
pub use selection::{SelectableList, SelectionChange};
