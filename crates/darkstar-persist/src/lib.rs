//! Persisted object reconstruction for Darkstar assets.
//!
//! Engine files embed typed objects inside chunks. A chunk tagged `PERS`
//! names its class and format version; any other chunk identifier is itself
//! the type tag. The [`Registry`] maps both kinds of key to a constructor so
//! container walkers can rebuild objects without knowing their types.
//!
//! # Example
//!
//! ```
//! use darkstar_common::MemStream;
//! use darkstar_persist::{MaterialList, Registry};
//!
//! let mut registry = Registry::new();
//! MaterialList::register(&mut registry);
//!
//! let object = registry.create_by_name("TS::MaterialList").unwrap();
//! assert_eq!(object.class_name(), "TS::MaterialList");
//! ```

mod error;
mod material;
mod object;
mod registry;

pub use error::{Error, Result};
pub use material::{Material, MaterialList, MaterialSource};
pub use object::{AsAny, PersistObject};
pub use registry::{global, Factory, Registry};
