//! Shared fixtures for distribution tree tests
//!
//! Provides signing material minted on the fly and a region → date → hour
//! tree resembling a real key distribution layout.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use dist_assembly::crypto::{generate_self_signed, CryptoProvider};
use dist_assembly::formatters;
use dist_assembly::structure::decorator::{IndexingDecorator, SigningDecorator};
use dist_assembly::{Directory, DirectoryNode, File, FileNode, IndexDirectory, IndexStack};

/// Signing material backed by a fresh self-signed certificate
pub fn test_provider() -> Arc<CryptoProvider> {
    let identity = generate_self_signed("dist.test").unwrap();
    Arc::new(CryptoProvider::from_pem(&identity.private_key_pem, &identity.certificate_pem).unwrap())
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
}

/// Which dates and hours have data, per region
pub fn sample_data() -> BTreeMap<&'static str, BTreeMap<NaiveDate, Vec<u32>>> {
    let mut data = BTreeMap::new();
    data.insert(
        "DE",
        BTreeMap::from([(date(1), vec![0, 1, 23]), (date(2), vec![5])]),
    );
    data.insert("FR", BTreeMap::from([(date(2), vec![12])]));
    data
}

fn hours_for(indices: &IndexStack) -> Result<Vec<NaiveDateTime>, dist_assembly::BoxError> {
    let day = *indices.peek_as::<NaiveDate>().ok_or("missing date")?;
    let region = *indices.find::<&'static str>().ok_or("missing region")?;
    let hours = sample_data()
        .get(region)
        .and_then(|dates| dates.get(&day).cloned())
        .unwrap_or_default();
    Ok(hours
        .into_iter()
        .filter_map(|hour| day.and_hms_opt(hour, 0, 0))
        .collect())
}

/// Signed `index` file listing the ancestor chain, e.g. `["DE","2021-01-01"]`
fn signed_index(provider: Arc<CryptoProvider>) -> Box<dyn FileNode> {
    Box::new(SigningDecorator::new(
        File::json("index", |indices| {
            let mut chain: Vec<String> = indices
                .iter()
                .map(|value| {
                    let any = value.as_any();
                    if let Some(region) = any.downcast_ref::<&'static str>() {
                        region.to_string()
                    } else if let Some(day) = any.downcast_ref::<NaiveDate>() {
                        formatters::iso_date(day)
                    } else if let Some(time) = any.downcast_ref::<NaiveDateTime>() {
                        formatters::hour(time)
                    } else {
                        format!("{:?}", value)
                    }
                })
                .collect();
            chain.reverse();
            chain
        }),
        provider,
    ))
}

/// `version/v1/country/<region>/date/<date>/hour/<hour>/index`
pub fn distribution_tree(provider: Arc<CryptoProvider>) -> Directory {
    let mut regions = IndexDirectory::new(
        "country",
        |_: &IndexStack| Ok(sample_data().into_keys().collect::<Vec<_>>()),
        |region: &&'static str| region.to_string(),
    );

    let date_provider = Arc::clone(&provider);
    regions.add_directory_to_all(move |_| {
        let mut dates = IndexDirectory::new(
            "date",
            |indices: &IndexStack| {
                let region = *indices.peek_as::<&'static str>().ok_or("missing region")?;
                let dates: Vec<NaiveDate> = sample_data()
                    .get(region)
                    .map(|dates| dates.keys().copied().collect())
                    .unwrap_or_default();
                Ok(dates)
            },
            formatters::iso_date,
        );

        let index_provider = Arc::clone(&date_provider);
        dates.add_file_to_all(move |_| signed_index(Arc::clone(&index_provider)));

        let hour_provider = Arc::clone(&date_provider);
        dates.add_directory_to_all(move |_| {
            let mut hours = IndexDirectory::new("hour", hours_for, formatters::hour);
            let index_provider = Arc::clone(&hour_provider);
            hours.add_file_to_all(move |_| signed_index(Arc::clone(&index_provider)));
            Box::new(IndexingDecorator::new(hours))
        });

        Box::new(IndexingDecorator::new(dates))
    });

    let mut v1 = Directory::new("v1");
    v1.add_directory(Box::new(IndexingDecorator::new(regions))).unwrap();

    let mut root = Directory::new("version");
    root.add_directory(Box::new(v1)).unwrap();
    root
}
