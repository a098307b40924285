//! Business-layer facade over the store, the catalog and the engines.
//!
//! Each call loads the owning product once, fetches the catalog at most once
//! and, for writes, persists the whole product document once at the end.

use crate::catalog::{CatalogIndex, CatalogSource};
use crate::config::AclConfig;
use crate::error::{AclError, RecordKind, Result};
use crate::preview::{self, ensure_granular};
use crate::projection::{self, ProjectedAcl};
use crate::store::{product_from_document, product_to_document, AclStore};
use acl_types::{AclTree, AclType, Package, PreviewGranularity, PreviewRecord, Product, ServiceRules};
use std::sync::Arc;

pub struct AclService {
    store: Arc<dyn AclStore>,
    catalog: Arc<dyn CatalogSource>,
    config: AclConfig,
}

impl AclService {
    pub fn new(store: Arc<dyn AclStore>, catalog: Arc<dyn CatalogSource>, config: AclConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    /// Project a product scope ACL. `envs` adds to the configured environments.
    pub async fn scope_projection(&self, product_code: &str, envs: &[String]) -> Result<ProjectedAcl> {
        let product = self.load_product(product_code).await?;
        let catalog = self.catalog_index().await?;
        Ok(projection::project_scope(
            &product.scope,
            &catalog,
            &self.environments(envs),
        ))
    }

    pub async fn package_projection(
        &self,
        product_code: &str,
        package_code: &str,
        envs: &[String],
    ) -> Result<ProjectedAcl> {
        let product = self.load_product(product_code).await?;
        let package = find_package(&product, package_code)?;
        let catalog = self.catalog_index().await?;
        Ok(projection::project_package(
            package,
            &catalog,
            &self.environments(envs),
        ))
    }

    // ------------------------------------------------------------------
    // Previews
    // ------------------------------------------------------------------

    pub async fn preview_scope(
        &self,
        product_code: &str,
        main_env: &str,
        sec_env: &str,
        granularity: PreviewGranularity,
    ) -> Result<Vec<PreviewRecord>> {
        let product = self.load_product(product_code).await?;
        let records = match granularity {
            PreviewGranularity::Service => preview::preview_services(&product.scope, main_env, sec_env),
            PreviewGranularity::Api => {
                let catalog = self.catalog_index().await?;
                preview::preview_apis(&product.scope, main_env, sec_env, &catalog)
            }
        };
        tracing::debug!(product = product_code, main_env, sec_env, records = records.len(), "scope preview");
        Ok(records)
    }

    pub async fn preview_package(
        &self,
        product_code: &str,
        package_code: &str,
        main_env: &str,
        sec_env: &str,
        granularity: PreviewGranularity,
    ) -> Result<Vec<PreviewRecord>> {
        let product = self.load_product(product_code).await?;
        let package = find_package(&product, package_code)?;
        let records = match granularity {
            PreviewGranularity::Service => preview::preview_services(&package.acl, main_env, sec_env),
            PreviewGranularity::Api => {
                // Gate before touching the catalog.
                ensure_granular(package, [main_env, sec_env])?;
                let catalog = self.catalog_index().await?;
                preview::preview_package_apis(package, main_env, sec_env, &catalog)?
            }
        };
        tracing::debug!(
            product = product_code,
            package = package_code,
            main_env,
            sec_env,
            records = records.len(),
            "package preview"
        );
        Ok(records)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Apply edited preview records to the scope ACL and persist the result.
    pub async fn apply_scope(
        &self,
        product_code: &str,
        target_env: &str,
        records: &[PreviewRecord],
    ) -> Result<AclTree> {
        let mut product = self.load_product(product_code).await?;
        let catalog = self.catalog_index().await?;

        let updated = preview::apply_scope(&product.scope, target_env, records, &catalog)?;
        product.scope = updated.clone();
        self.save_product(&product).await?;

        tracing::info!(product = product_code, target_env, records = records.len(), "applied scope preview");
        Ok(updated)
    }

    /// Apply edited preview records to a package ACL and persist the result.
    pub async fn apply_package(
        &self,
        product_code: &str,
        package_code: &str,
        target_env: &str,
        records: &[PreviewRecord],
    ) -> Result<AclTree> {
        let mut product = self.load_product(product_code).await?;
        let catalog = self.catalog_index().await?;

        let package = find_package_mut(&mut product, package_code)?;
        let updated = preview::apply_package(package, target_env, records, &catalog)?;
        package.acl = updated.clone();
        self.save_product(&product).await?;

        tracing::info!(
            product = product_code,
            package = package_code,
            target_env,
            records = records.len(),
            "applied package preview"
        );
        Ok(updated)
    }

    /// Replace one environment of the scope ACL. An empty map removes it.
    pub async fn replace_scope_environment(
        &self,
        product_code: &str,
        env: &str,
        services: ServiceRules,
    ) -> Result<AclTree> {
        let mut product = self.load_product(product_code).await?;
        product.scope.replace_environment(env, services);
        self.save_product(&product).await?;

        tracing::info!(product = product_code, env, "replaced scope environment");
        Ok(product.scope)
    }

    /// Replace one environment of a package ACL. An empty map removes it.
    pub async fn replace_package_environment(
        &self,
        product_code: &str,
        package_code: &str,
        env: &str,
        services: ServiceRules,
    ) -> Result<AclTree> {
        let mut product = self.load_product(product_code).await?;
        let package = find_package_mut(&mut product, package_code)?;
        package.acl.replace_environment(env, services);
        let updated = package.acl.clone();
        self.save_product(&product).await?;

        tracing::info!(product = product_code, package = package_code, env, "replaced package environment");
        Ok(updated)
    }

    pub async fn set_package_acl_type(
        &self,
        product_code: &str,
        package_code: &str,
        env: &str,
        acl_type: AclType,
    ) -> Result<()> {
        let mut product = self.load_product(product_code).await?;
        let package = find_package_mut(&mut product, package_code)?;
        package.acl_type_by_env.insert(env.to_string(), acl_type);
        self.save_product(&product).await?;

        tracing::info!(
            product = product_code,
            package = package_code,
            env,
            acl_type = acl_type.as_str(),
            "set package acl type"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_product(&self, code: &str) -> Result<Product> {
        let document = self
            .store
            .load_product(code)
            .await?
            .ok_or_else(|| AclError::not_found(RecordKind::Product, code))?;
        product_from_document(&document)
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let document = product_to_document(product)?;
        self.store.save_product(&product.code, document).await
    }

    async fn catalog_index(&self) -> Result<CatalogIndex> {
        CatalogIndex::fetch(self.catalog.as_ref(), &self.config.catalog.query()).await
    }

    fn environments(&self, requested: &[String]) -> Vec<String> {
        let mut envs = self.config.environments.clone();
        for env in requested {
            if !envs.contains(env) {
                envs.push(env.clone());
            }
        }
        envs
    }
}

fn find_package<'a>(product: &'a Product, code: &str) -> Result<&'a Package> {
    product
        .package(code)
        .ok_or_else(|| AclError::not_found(RecordKind::Package, code))
}

fn find_package_mut<'a>(product: &'a mut Product, code: &str) -> Result<&'a mut Package> {
    product
        .package_mut(code)
        .ok_or_else(|| AclError::not_found(RecordKind::Package, code))
}
