use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{DomainError, DomainResult};

const MAX_PACKAGE_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(String);

impl PackageId {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let id = raw.trim();

        if id.is_empty() || id.len() > MAX_PACKAGE_ID_LEN {
            return Err(DomainError::InvalidPackageId(raw.to_string()));
        }

        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid_chars {
            return Err(DomainError::InvalidPackageId(raw.to_string()));
        }

        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PackageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditPackage {
    pub id: PackageId,
    pub name: String,
    pub credits: i64,
    pub price_minor_units: i64,
    pub external_price_ref: Option<String>,
}

/// Immutable lookup table from package id to what a purchase grants.
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    packages: BTreeMap<PackageId, CreditPackage>,
}

impl PackageCatalog {
    pub fn new(packages: Vec<CreditPackage>) -> DomainResult<Self> {
        if packages.is_empty() {
            return Err(DomainError::ConfigError {
                message: "package catalog cannot be empty".to_string(),
            });
        }

        let mut by_id = BTreeMap::new();
        for package in packages {
            if package.credits <= 0 {
                return Err(DomainError::ConfigError {
                    message: format!("package '{}' must grant a positive credit amount", package.id),
                });
            }
            if package.price_minor_units <= 0 {
                return Err(DomainError::ConfigError {
                    message: format!("package '{}' must have a positive price", package.id),
                });
            }
            if by_id.contains_key(&package.id) {
                return Err(DomainError::ConfigError {
                    message: format!("duplicate package id '{}'", package.id),
                });
            }
            by_id.insert(package.id.clone(), package);
        }

        Ok(Self { packages: by_id })
    }

    pub fn get(&self, id: &PackageId) -> Option<&CreditPackage> {
        self.packages.get(id)
    }

    /// Resolves a raw, client-supplied identifier.
    pub fn lookup(&self, raw_id: &str) -> Option<&CreditPackage> {
        PackageId::parse(raw_id)
            .ok()
            .and_then(|id| self.packages.get(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreditPackage> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(id: &str, credits: i64, price: i64) -> CreditPackage {
        CreditPackage {
            id: PackageId::parse(id).unwrap(),
            name: id.to_string(),
            credits,
            price_minor_units: price,
            external_price_ref: None,
        }
    }

    #[test]
    fn package_id_rejects_uppercase_and_spaces() {
        assert!(PackageId::parse("Pro").is_err());
        assert!(PackageId::parse("pro plan").is_err());
        assert!(PackageId::parse("").is_err());
        assert!(PackageId::parse("pro-2024").is_ok());
    }

    #[test]
    fn lookup_resolves_known_package() {
        let catalog = PackageCatalog::new(vec![package("basic", 100, 999)]).unwrap();
        assert_eq!(catalog.lookup("basic").map(|p| p.credits), Some(100));
        assert!(catalog.lookup("gold").is_none());
        assert!(catalog.lookup("BASIC").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = PackageCatalog::new(vec![package("pro", 500, 3999), package("pro", 1, 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        assert!(PackageCatalog::new(vec![package("free", 0, 100)]).is_err());
        assert!(PackageCatalog::new(vec![package("gift", 10, 0)]).is_err());
        assert!(PackageCatalog::new(vec![]).is_err());
    }
}
