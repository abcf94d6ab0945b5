use sql_stream::prelude::*;

#[test]
fn create_insert_select_invokes_callback_once() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    (&db << "create table t(a int, b text)").execute()?;
    (&db << "insert into t values (?,?)" << 5 << "x").execute()?;

    let mut calls = Vec::new();
    ((&db << "select a,b from t") >> rows(|a: i32, b: String| calls.push((a, b))))?;
    assert_eq!(calls, vec![(5, "x".to_string())]);
    Ok(())
}

#[test]
fn callback_runs_once_per_row_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table people(id integer primary key, name text, score real)")?;
    for (name, score) in [("ann", 1.5), ("bob", 2.0), ("cy", 3.25)] {
        (&db << "insert into people(name, score) values (?, ?)" << name << score).execute()?;
    }

    let mut seen = Vec::new();
    db.prepare("select id, name, score from people order by id")?
        .for_each(|id: i64, name: String, score: f64| seen.push((id, name, score)))?;
    assert_eq!(
        seen,
        vec![
            (1, "ann".to_string(), 1.5),
            (2, "bob".to_string(), 2.0),
            (3, "cy".to_string(), 3.25),
        ]
    );
    Ok(())
}

#[test]
fn zero_argument_callback_counts_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut count = 0;
    ((&db << "select 1 union all select 2 union all select 3") >> rows(|| count += 1))?;
    assert_eq!(count, 3);

    let mut none = 0;
    ((&db << "select 1 where 0") >> rows(|| none += 1))?;
    assert_eq!(none, 0);
    Ok(())
}

#[test]
fn callback_may_read_fewer_columns_than_returned() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut first = 0i64;
    ((&db << "select 10, 20, 30") >> rows(|a: i64| first = a))?;
    assert_eq!(first, 10);
    Ok(())
}

#[test]
fn callback_wider_than_result_fails_before_invocation() -> Result<(), Box<dyn std::error::Error>>
{
    let db = Database::open_in_memory();
    let mut invoked = false;
    let err = ((&db << "select 1") >> rows(|_a: i64, _b: i64| invoked = true)).unwrap_err();
    assert!(matches!(err, SqlStreamError::Sqlite(_)));
    assert!(!invoked);
    Ok(())
}

#[test]
fn many_argument_callback() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut sum = 0i64;
    ((&db << "select 1, 2, 3, 4, 5, 6, 7, 8")
        >> rows(
            |a: i64, b: i64, c: i64, d: i64, e: i64, f: i64, g: i64, h: i64| {
                sum = a + b + c + d + e + f + g + h;
            },
        ))?;
    assert_eq!(sum, 36);
    Ok(())
}

#[test]
fn records_expose_columns_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut records = Vec::new();
    db.prepare("select 1 as id, 'x' as name, null as missing union all select 2, 'y', 3.5")?
        .for_each_record(|record| records.push(record))?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(records[0].get("name").and_then(SqlValue::as_text), Some("x"));
    assert!(records[0].get("missing").is_some_and(SqlValue::is_null));
    assert_eq!(records[1].get("missing"), Some(&SqlValue::Float(3.5)));
    assert_eq!(records[1].column_names.as_slice(), ["id", "name", "missing"]);
    Ok(())
}
