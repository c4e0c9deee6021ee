//! Storage for machine Groups, Profiles, and Templates.
//!
//! The [`Store`] trait exposes put/get/delete/list per resource kind. Three
//! backends implement it: [`FileStore`] (a JSON tree on disk), [`EtcdStore`]
//! (namespaced keys in an etcd cluster), and [`MemoryStore`] (ephemeral,
//! also used as the test fake).

mod defaults;
mod etcd_store;
mod file_store;
mod memory_store;
pub mod resources;
mod store;

pub use defaults::assert_default_templates;
pub use etcd_store::{EtcdStore, EtcdStoreConfig};
pub use file_store::{FileStore, FileStoreConfig};
pub use memory_store::MemoryStore;
pub use resources::{canonicalize_mac, Group, Profile, Template, ValidationError};
pub use store::{Store, StoreError};
