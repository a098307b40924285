//! ACL Types - Level 1 Foundation Types
//!
//! Pure data structures shared by every layer of the gateway ACL engine:
//!
//! - `Rule` / `Grant` - one access rule per environment/service/version
//! - `AclTree` - env -> service -> version -> rule, with navigation helpers
//! - `CatalogService` - records of the remote API catalog
//! - `PreviewRecord` - flattened environment comparison entries
//! - `Product` / `Package` - owning records of the ACL trees
//!
//! ## Critical Rules
//!
//! 1. **NO ENGINE LOGIC** - projections, diffs and apply live in `gateway-acl`
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - every type round-trips through serde in its stored shape

pub mod catalog;
pub mod preview;
pub mod record;
pub mod rule;
pub mod tree;

pub use catalog::{CatalogApi, CatalogService, CatalogVersion};
pub use preview::{PreviewGranularity, PreviewRecord};
pub use record::{Package, Product};
pub use rule::{AccessType, ApiAccessMap, Grant, GroupGrants, Rule, RuleShapeError};
pub use tree::{AclTree, AclType, ServiceRules, VersionRules};
