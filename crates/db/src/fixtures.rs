use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use penny_core::domain::procurement::{ProcurementRecord, SupplierCode};

use crate::repositories::{ProcurementRepository, RepositoryError};

/// (date, hour, cents, item, supplier code, supplier, department, quantity, acquisition type, location)
type DemoRow = (
    (i32, u32, u32),
    u32,
    i64,
    &'static str,
    i64,
    &'static str,
    &'static str,
    i64,
    &'static str,
    &'static str,
);

#[rustfmt::skip]
const DEMO_ROWS: &[DemoRow] = &[
    ((2012, 7, 2), 9, 125_000, "Toner Cartridge", 1200, "Office Depot", "Department of Public Health", 50, "NON-IT Goods", "Sacramento"),
    ((2012, 7, 18), 14, 48_500, "Copy Paper", 1200, "Office Depot", "Department of Corrections", 200, "NON-IT Goods", "Folsom"),
    ((2012, 9, 5), 10, 2_390_000, "Server Rack", 3100, "Dell Marketing", "Department of Technology", 2, "IT Goods", "Rancho Cordova"),
    ((2012, 11, 21), 11, 74_950, "Desk Chair", 500, "Acme Supply", "Department of Parks and Recreation", 15, "NON-IT Goods", "Sacramento"),
    ((2013, 1, 9), 8, 36_000, "Copy Paper", 1200, "Office Depot", "Department of Public Health", 150, "NON-IT Goods", "Sacramento"),
    ((2013, 2, 14), 16, 1_150_000, "Laptop", 3100, "Dell Marketing", "Department of Motor Vehicles", 10, "IT Goods", "Sacramento"),
    ((2013, 3, 3), 13, 9_800, "Safety Gloves", 740, "Grainger", "Department of Corrections", 400, "NON-IT Goods", "Vacaville"),
    ((2013, 3, 27), 9, 52_000, "Toner Cartridge", 1200, "Office Depot", "Department of Motor Vehicles", 20, "NON-IT Goods", "Sacramento"),
    ((2013, 4, 30), 15, 410_000, "Network Switch", 2875, "CDW Government", "Department of Technology", 8, "IT Goods", "Rancho Cordova"),
    ((2013, 6, 12), 10, 18_750, "Copy Paper", 1200, "Office Depot", "Department of Parks and Recreation", 75, "NON-IT Goods", "Sacramento"),
    ((2013, 7, 1), 12, 6_400, "Safety Gloves", 740, "Grainger", "Department of Public Health", 260, "NON-IT Goods", "Richmond"),
    ((2013, 8, 9), 9, 275_000, "Vaccine Refrigerator", 915, "Helmer Scientific", "Department of Public Health", 3, "NON-IT Goods", "Richmond"),
    ((2013, 9, 16), 17, 88_000, "Desk Chair", 500, "Acme Supply", "Department of Motor Vehicles", 20, "NON-IT Goods", "Sacramento"),
    ((2013, 10, 2), 11, 1_620_000, "Consulting Services", 4410, "Deloitte Consulting", "Department of Technology", 1, "IT Services", "Sacramento"),
    ((2013, 11, 19), 14, 22_400, "Copy Paper", 1200, "Office Depot", "Department of Corrections", 90, "NON-IT Goods", "Folsom"),
    ((2013, 12, 30), 10, 330_000, "Patrol Vehicle Tires", 1875, "Goodyear", "California Highway Patrol", 120, "NON-IT Goods", "Sacramento"),
    ((2014, 1, 15), 9, 57_500, "Toner Cartridge", 1200, "Office Depot", "California Highway Patrol", 25, "NON-IT Goods", "Sacramento"),
    ((2014, 2, 6), 13, 1_240_000, "Laptop", 3100, "Dell Marketing", "Department of Public Health", 11, "IT Goods", "Sacramento"),
    ((2014, 3, 11), 15, 12_600, "Safety Gloves", 740, "Grainger", "Department of Parks and Recreation", 500, "NON-IT Goods", "Sacramento"),
    ((2014, 4, 22), 10, 96_000, "Desk Chair", 500, "Acme Supply", "Department of Public Health", 24, "NON-IT Goods", "Richmond"),
    ((2014, 5, 8), 8, 41_000, "Copy Paper", 1200, "Office Depot", "Department of Motor Vehicles", 170, "NON-IT Goods", "Sacramento"),
    ((2014, 6, 27), 16, 2_050_000, "Consulting Services", 4410, "Deloitte Consulting", "California Highway Patrol", 1, "IT Services", "Sacramento"),
    ((2014, 6, 30), 12, 145_000, "Network Switch", 2875, "CDW Government", "Department of Corrections", 4, "IT Goods", "Folsom"),
];

/// Deterministic demo dataset used by `penny seed` and by end-to-end tests.
pub struct DemoDataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub records_inserted: u64,
    pub total_records: i64,
}

impl DemoDataset {
    pub fn records() -> Result<Vec<ProcurementRecord>, RepositoryError> {
        DEMO_ROWS
            .iter()
            .map(
                |&(
                    (year, month, day),
                    hour,
                    cents,
                    item_name,
                    supplier_code,
                    supplier_name,
                    department_name,
                    quantity,
                    acquisition_type,
                    location,
                )|
                 -> Result<ProcurementRecord, RepositoryError> {
                    let creation_date = NaiveDate::from_ymd_opt(year, month, day)
                        .and_then(|date| date.and_hms_opt(hour, 0, 0))
                        .map(|naive| naive.and_utc())
                        .ok_or_else(|| {
                            RepositoryError::InvalidImport(format!(
                                "demo row {year}-{month}-{day} has an invalid timestamp"
                            ))
                        })?;

                    Ok(ProcurementRecord {
                        creation_date,
                        total_price: Decimal::new(cents, 2),
                        item_name: item_name.to_string(),
                        supplier_code: SupplierCode(supplier_code),
                        supplier_name: supplier_name.to_string(),
                        department_name: department_name.to_string(),
                        quantity,
                        acquisition_type: acquisition_type.to_string(),
                        location: location.to_string(),
                    })
                },
            )
            .collect()
    }

    /// Inserts the demo rows. Not idempotent: running twice doubles every aggregate.
    pub async fn load(repo: &dyn ProcurementRepository) -> Result<SeedResult, RepositoryError> {
        let records = Self::records()?;
        load_records(repo, &records).await
    }
}

pub async fn load_records(
    repo: &dyn ProcurementRepository,
    records: &[ProcurementRecord],
) -> Result<SeedResult, RepositoryError> {
    let records_inserted = repo.insert_many(records).await?;
    let total_records = repo.count_all().await?;
    Ok(SeedResult { records_inserted, total_records })
}

/// One element of an import file. Field names follow the published purchase-order
/// dataset ("Creation Date", "Total Price", ...); snake_case names are accepted too.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(rename = "Creation Date", alias = "creation_date")]
    creation_date: String,
    #[serde(rename = "Total Price", alias = "total_price")]
    total_price: Decimal,
    #[serde(rename = "Item Name", alias = "item_name")]
    item_name: String,
    #[serde(rename = "Supplier Code", alias = "supplier_code")]
    supplier_code: i64,
    #[serde(rename = "Supplier Name", alias = "supplier_name")]
    supplier_name: String,
    #[serde(rename = "Department Name", alias = "department_name")]
    department_name: String,
    #[serde(rename = "Quantity", alias = "quantity", default)]
    quantity: i64,
    #[serde(rename = "Acquisition Type", alias = "acquisition_type", default)]
    acquisition_type: String,
    #[serde(rename = "Location", alias = "location", default)]
    location: String,
}

pub fn parse_import(raw: &str) -> Result<Vec<ProcurementRecord>, RepositoryError> {
    let rows: Vec<ImportRecord> = serde_json::from_str(raw).map_err(|e| {
        RepositoryError::InvalidImport(format!("expected a JSON array of records: {e}"))
    })?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<ProcurementRecord, RepositoryError> {
            let creation_date = parse_import_date(&row.creation_date).ok_or_else(|| {
                RepositoryError::InvalidImport(format!(
                    "record {index}: unrecognized creation date `{}`",
                    row.creation_date
                ))
            })?;

            Ok(ProcurementRecord {
                creation_date,
                total_price: row.total_price,
                item_name: row.item_name,
                supplier_code: SupplierCode(row.supplier_code),
                supplier_name: row.supplier_name,
                department_name: row.department_name,
                quantity: row.quantity,
                acquisition_type: row.acquisition_type,
                location: row.location,
            })
        })
        .collect()
}

fn parse_import_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use penny_core::domain::procurement::SupplierCode;

    use super::{parse_import, DemoDataset};
    use crate::repositories::{InMemoryProcurementRepository, RepositoryError};

    #[test]
    fn demo_dataset_is_deterministic_and_covers_every_aggregation() {
        let first = DemoDataset::records().expect("records");
        let second = DemoDataset::records().expect("records");
        assert_eq!(first, second);

        let departments: HashSet<_> = first.iter().map(|r| r.department_name.as_str()).collect();
        let suppliers: HashSet<_> = first.iter().map(|r| r.supplier_code).collect();
        assert!(departments.len() >= 5);
        assert!(suppliers.contains(&SupplierCode(500)));
        assert!(first.iter().all(|record| record.total_price > Decimal::ZERO));
    }

    #[tokio::test]
    async fn demo_load_reports_inserted_and_total_counts() {
        let repo = InMemoryProcurementRepository::default();
        let result = DemoDataset::load(&repo).await.expect("load");
        let expected = DemoDataset::records().expect("records").len() as u64;

        assert_eq!(result.records_inserted, expected);
        assert_eq!(result.total_records, expected as i64);
    }

    #[test]
    fn import_accepts_dataset_column_names() {
        let raw = r#"[
            {
                "Creation Date": "08/27/2013",
                "Total Price": 1000.5,
                "Item Name": "Copy Paper",
                "Supplier Code": 500,
                "Supplier Name": "Acme Supply",
                "Department Name": "Department of Parks and Recreation",
                "Quantity": 12,
                "Acquisition Type": "NON-IT Goods",
                "Location": "Sacramento"
            },
            {
                "creation_date": "2014-02-01T10:30:00Z",
                "total_price": "25.00",
                "item_name": "Toner",
                "supplier_code": 1200,
                "supplier_name": "Office Depot",
                "department_name": "Department of Corrections"
            }
        ]"#;

        let records = parse_import(raw).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].creation_date, Utc.with_ymd_and_hms(2013, 8, 27, 0, 0, 0).unwrap());
        assert_eq!(records[0].total_price, Decimal::new(10005, 1));
        assert_eq!(records[1].quantity, 0);
        assert_eq!(records[1].location, "");
    }

    #[test]
    fn import_rejects_unknown_date_formats_with_record_index() {
        let raw = r#"[{
            "Creation Date": "last tuesday",
            "Total Price": 1,
            "Item Name": "Paper",
            "Supplier Code": 1,
            "Supplier Name": "Acme",
            "Department Name": "Parks"
        }]"#;

        let error = parse_import(raw).expect_err("bad date");
        assert!(matches!(error, RepositoryError::InvalidImport(ref message) if message.contains("record 0")));
    }

    #[test]
    fn import_rejects_non_array_payloads() {
        assert!(matches!(parse_import("{}"), Err(RepositoryError::InvalidImport(_))));
    }
}
