use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use penny_core::domain::procurement::{ProcurementRecord, SupplierCode};
use penny_core::domain::query::DepartmentMatch;
use penny_core::domain::window::{DateRange, EndBound};
use penny_db::{
    connect_with_settings, migrations, DemoDataset, InMemoryProcurementRepository,
    ProcurementRepository, SqlProcurementRepository,
};

type ParityTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr, $($arg:tt)*) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err(format!("{}: `{:?}` != `{:?}`", format!($($arg)*), left, right));
                }
            }
        }
    };
}

async fn seeded_sql() -> ParityTestResult<SqlProcurementRepository> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|e| format!("connect failed: {e}"))?;
    migrations::run_pending(&pool, "purchase_orders")
        .await
        .map_err(|e| format!("migrations failed: {e}"))?;
    let repo = SqlProcurementRepository::new(pool, "purchase_orders")
        .map_err(|e| format!("repository failed: {e}"))?;
    DemoDataset::load(&repo).await.map_err(|e| format!("seed failed: {e}"))?;
    Ok(repo)
}

async fn seeded_memory() -> ParityTestResult<InMemoryProcurementRepository> {
    let repo = InMemoryProcurementRepository::default();
    DemoDataset::load(&repo).await.map_err(|e| format!("seed failed: {e}"))?;
    Ok(repo)
}

fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> ParityTestResult<DateRange> {
    let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2).ok_or("bad start date")?;
    let end = NaiveDate::from_ymd_opt(end.0, end.1, end.2).ok_or("bad end date")?;
    DateRange::new(start, end).map_err(|e| e.to_string())
}

#[tokio::test]
async fn sql_and_memory_repositories_agree_on_demo_dataset() -> ParityTestResult {
    let sql = seeded_sql().await?;
    let memory = seeded_memory().await?;
    let err = |e: penny_db::RepositoryError| e.to_string();

    let windows = [
        range((2013, 1, 1), (2013, 12, 31))?.window(EndBound::Midnight),
        range((2013, 1, 1), (2013, 12, 31))?.window(EndBound::EndOfDay),
        range((2014, 6, 27), (2014, 6, 30))?.window(EndBound::Midnight),
        range((2014, 6, 27), (2014, 6, 30))?.window(EndBound::EndOfDay),
    ];
    for window in &windows {
        require_eq!(
            sql.count_created_between(window).await.map_err(err)?,
            memory.count_created_between(window).await.map_err(err)?,
            "order counts differ for {window:?}"
        );
        require_eq!(
            sql.total_cost_between(window).await.map_err(err)?,
            memory.total_cost_between(window).await.map_err(err)?,
            "procurement cost differs for {window:?}"
        );
    }

    require_eq!(
        sql.highest_spending_period().await.map_err(err)?,
        memory.highest_spending_period().await.map_err(err)?,
        "highest spending period differs"
    );
    require_eq!(
        sql.most_ordered_items(5).await.map_err(err)?,
        memory.most_ordered_items(5).await.map_err(err)?,
        "frequent items differ"
    );
    require_eq!(
        sql.department_spending().await.map_err(err)?,
        memory.department_spending().await.map_err(err)?,
        "department spending differs"
    );

    for code in [500, 740, 1200, 9999] {
        let code = SupplierCode(code);
        require_eq!(
            sql.find_by_supplier_code(code).await.map_err(err)?,
            memory.find_by_supplier_code(code).await.map_err(err)?,
            "supplier lookup differs for {code}"
        );
        require_eq!(
            sql.supplier_spend(code).await.map_err(err)?,
            memory.supplier_spend(code).await.map_err(err)?,
            "supplier spend differs for {code}"
        );
        require_eq!(
            sql.count_by_supplier_code(code).await.map_err(err)?,
            memory.count_by_supplier_code(code).await.map_err(err)?,
            "supplier order count differs for {code}"
        );
    }

    for (department, mode) in [
        ("public health", DepartmentMatch::Substring),
        ("Department of Corrections", DepartmentMatch::Exact),
        ("corrections", DepartmentMatch::Exact),
    ] {
        require_eq!(
            sql.items_by_department(department, mode).await.map_err(err)?,
            memory.items_by_department(department, mode).await.map_err(err)?,
            "department items differ for {department} ({mode:?})"
        );
    }

    Ok(())
}

#[tokio::test]
async fn demo_dataset_satisfies_aggregation_contract() -> ParityTestResult {
    let sql = seeded_sql().await?;
    let err = |e: penny_db::RepositoryError| e.to_string();
    let total = sql.count_all().await.map_err(err)?;

    let everything = range((2000, 1, 1), (2030, 12, 31))?.window(EndBound::Midnight);
    require_eq!(
        sql.count_created_between(&everything).await.map_err(err)?,
        total,
        "covering range should count every record"
    );

    let nothing = range((1999, 1, 1), (1999, 12, 31))?.window(EndBound::Midnight);
    require_eq!(
        sql.count_created_between(&nothing).await.map_err(err)?,
        0,
        "range outside the dataset should count nothing"
    );

    let items = sql.most_ordered_items(5).await.map_err(err)?;
    require!(items.len() <= 5, "at most five items expected, got {}", items.len());
    require!(
        items.windows(2).all(|pair| pair[0].count > pair[1].count
            || (pair[0].count == pair[1].count && pair[0].item_name < pair[1].item_name)),
        "items should sort by count desc then name asc: {items:?}"
    );

    let departments = sql.department_spending().await.map_err(err)?;
    require!(
        departments.windows(2).all(|pair| pair[0].total >= pair[1].total),
        "department spending should sort descending: {departments:?}"
    );

    Ok(())
}

#[tokio::test]
async fn department_substring_match_folds_non_ascii_case() -> ParityTestResult {
    let sql = seeded_sql().await?;
    let memory = seeded_memory().await?;
    let err = |e: penny_db::RepositoryError| e.to_string();

    let created = Utc
        .with_ymd_and_hms(2014, 3, 4, 0, 0, 0)
        .single()
        .ok_or("bad creation timestamp")?;
    let record = ProcurementRecord {
        creation_date: created,
        total_price: Decimal::new(12_50, 2),
        item_name: "Cahiers".to_string(),
        supplier_code: SupplierCode(9001),
        supplier_name: "Papeterie du Nord".to_string(),
        department_name: "ÉDUCATION Département".to_string(),
        quantity: 40,
        acquisition_type: "NON-IT Goods".to_string(),
        location: "Montréal".to_string(),
    };
    sql.insert_many(std::slice::from_ref(&record)).await.map_err(err)?;
    memory.insert_many(std::slice::from_ref(&record)).await.map_err(err)?;

    for requested in ["éducation", "ÉDUCATION", "département"] {
        let from_sql =
            sql.items_by_department(requested, DepartmentMatch::Substring).await.map_err(err)?;
        let from_memory =
            memory.items_by_department(requested, DepartmentMatch::Substring).await.map_err(err)?;
        require_eq!(from_sql, from_memory, "department items differ for {requested}");
        require_eq!(from_sql.len(), 1, "expected the accented department to match {requested}");
    }

    Ok(())
}
