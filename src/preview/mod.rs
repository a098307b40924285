//! Environment previews and promotion.
//!
//! - `diff` flattens two environments into a comparison list
//! - `apply` writes an edited comparison list back into one environment

pub mod apply;
pub mod diff;

pub use apply::{apply_package, apply_scope};
pub use diff::{preview_apis, preview_package_apis, preview_services};

use crate::error::{AclError, Result};
use acl_types::Package;

/// Fail with `NotGranular` on the first environment not in `granular` mode.
pub fn ensure_granular<'a>(package: &Package, envs: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for env in envs {
        if !package.is_granular(env) {
            return Err(AclError::NotGranular {
                package: package.code.clone(),
                env: env.to_string(),
            });
        }
    }
    Ok(())
}
