//! Remap Core - Declarative object-mapping engine
//!
//! This crate maps raw input mappings into domain objects (marshaling) and
//! renders domain objects back into output mappings (serialization), driven
//! by declarative field descriptions rather than hand-written glue code.
//!
//! # Main Components
//!
//! - **Fields**: typed field descriptions with per-kind marshal/serialize
//!   pipelines (`string`, `integer`, `boolean`, `decimal`, `datetime`,
//!   `date`, static constants, nested mappers, and collections)
//! - **Mappers**: ordered field sets with roles, partial updates, and
//!   cross-field validation hooks
//! - **Error Aggregation**: every invalid field is reported in one shot as
//!   a name-keyed payload mirroring the input shape
//! - **Registry**: name-based mapper lookup so nested references can be
//!   declared before their targets exist
//!
//! # Example
//!
//! ```
//! use remap_core::{FieldKind, FieldOptions, MapperBuilder, Registry, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let mapper = MapperBuilder::new("User")
//!         .field("id", FieldKind::integer(), FieldOptions::new())
//!         .field("name", FieldKind::string(), FieldOptions::new())
//!         .build()?;
//!
//!     let registry = Registry::new();
//!     let obj = mapper.marshal(&registry, &json!({"id": 1, "name": "mike"}))?;
//!     assert_eq!(obj, json!({"id": 1, "name": "mike"}));
//!
//!     let out = mapper.serialize(&registry, &obj)?;
//!     assert_eq!(out, json!({"id": 1, "name": "mike"}));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod accessor;
pub mod error;
pub mod field;
pub mod mapper;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod role;
pub mod session;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, ErrorMap, ErrorNode, Result};
pub use field::{CollectionConfig, Field, FieldKind, Getter, NestedConfig};
pub use mapper::{
    Mapper, MapperBuilder, MarshalOptions, PolymorphicMapper, ValidateHook, DEFAULT_ROLE,
};
pub use options::FieldOptions;
pub use pipeline::{Pipeline, Stage, StageFn, StageGroup};
pub use registry::Registry;
pub use role::{role_intersect, role_union, Role, RoleMode};
pub use session::{MapperScope, Session, MAX_NESTING_DEPTH};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
