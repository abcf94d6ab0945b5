use sql_stream::prelude::*;

fn count(db: &Database<'_>, table: &str) -> Result<i64, SqlStreamError> {
    let mut n = 0;
    ((db << format!("select count(*) from {table}")) >> &mut n)?;
    Ok(n)
}

#[test]
fn dropping_an_unextracted_binder_runs_it() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    drop(&db << "create table t(a int)");
    drop(&db << "insert into t values (?)" << 1);
    let _ = &db << "insert into t values (?)" << 2;
    assert_eq!(count(&db, "t")?, 2);
    assert_eq!(db.suppressed_error_count(), 0);
    Ok(())
}

#[test]
fn dropping_a_query_discards_its_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table t(a int); insert into t values (1), (2), (3);")?;

    let binder = db.prepare("select a from t")?;
    assert!(!binder.is_finalized());
    assert_eq!(binder.column_count(), 1);
    drop(binder);

    assert_eq!(db.suppressed_error_count(), 0);
    // The connection is free for writes again, nothing is left mid-step.
    db.execute_batch("drop table t")?;
    Ok(())
}

#[test]
fn teardown_errors_are_recorded_not_raised() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table u(x int unique)")?;
    drop(&db << "insert into u values (?)" << 1);
    drop(&db << "insert into u values (?)" << 1);

    assert_eq!(db.suppressed_error_count(), 1);
    let message = db.take_suppressed_error().ok_or("no message")?;
    assert!(message.contains("UNIQUE"), "unexpected message: {message}");
    assert_eq!(count(&db, "u")?, 1);
    Ok(())
}

#[test]
fn each_bind_advances_the_cursor_by_one() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut binder = db.prepare("select ?, ?, ?, ?")?;
    assert_eq!(binder.parameter_count(), 4);
    assert_eq!(binder.parameter_index(), 1);
    binder.bind(1)?;
    assert_eq!(binder.parameter_index(), 2);
    binder.bind("two")?;
    assert_eq!(binder.parameter_index(), 3);
    binder.bind(3.0)?;
    assert_eq!(binder.parameter_index(), 4);
    binder.bind(WideString::from("four"))?;
    assert_eq!(binder.parameter_index(), 5);

    let mut row = None;
    binder.for_each(|a: i64, b: String, c: f64, d: String| row = Some((a, b, c, d)))?;
    assert_eq!(row, Some((1, "two".into(), 3.0, "four".into())));
    Ok(())
}

#[test]
fn failed_bind_does_not_advance_the_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut binder = db.prepare("select ?")?;
    binder.bind(1)?;

    let err = binder.bind(2).unwrap_err();
    assert!(matches!(err, SqlStreamError::Sqlite(_)));
    assert_eq!(binder.parameter_index(), 2);

    let mut binder = db.prepare("select ?")?;
    let err = binder
        .bind(WideString::from_units(vec![0xD800]))
        .unwrap_err();
    assert!(matches!(err, SqlStreamError::ParameterError(_)));
    assert_eq!(binder.parameter_index(), 1);
    Ok(())
}

#[test]
fn operator_chain_defers_errors_to_extraction() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut v = 0;

    let err = ((&db << "selec nonsense" << 1 << 2) >> &mut v).unwrap_err();
    assert!(matches!(err, SqlStreamError::Sqlite(_)));

    let err = ((&db << "select ?" << 1 << 2) >> &mut v).unwrap_err();
    assert!(matches!(err, SqlStreamError::Sqlite(_)));
    assert_eq!(v, 0);

    assert!(matches!(
        db.prepare("selec nonsense"),
        Err(SqlStreamError::Sqlite(_))
    ));
    Ok(())
}

#[test]
fn record_mode_never_raises() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    let mut binder = db.statement("select ?").with_error_mode(ErrorMode::Record);
    binder.bind(1)?.bind(2)?;
    assert!(binder.error_occurred());
    assert_eq!(binder.parameter_index(), 2);

    let mut v = 0;
    binder.extract_into(&mut v)?;
    assert_eq!(v, 1);

    let mut broken = db.statement("selec nonsense").with_error_mode(ErrorMode::Record);
    assert!(broken.error_occurred());
    assert!(broken.is_finalized());
    broken.execute()?;
    drop(broken);

    assert_eq!(db.suppressed_error_count(), 3);
    Ok(())
}

#[test]
fn record_mode_inherited_from_the_database() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory();
    db.set_error_mode(ErrorMode::Record);
    let binder = db.prepare("selec nonsense")?;
    assert!(binder.error_occurred());
    assert_eq!(binder.error_mode(), ErrorMode::Record);
    Ok(())
}

#[test]
fn failed_operator_chain_never_runs_the_statement() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table t(a int)")?;

    let result = (&db << "insert into t values (?)" << 1 << 2).execute();
    assert!(matches!(result, Err(SqlStreamError::Sqlite(_))));
    assert_eq!(count(&db, "t")?, 0);

    drop(&db << "insert into t values (?)" << 1 << 2);
    assert_eq!(count(&db, "t")?, 0);
    assert_eq!(db.suppressed_error_count(), 1);
    Ok(())
}

#[test]
fn raised_bind_failure_finalizes_the_statement() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table t(a int)")?;

    let mut binder = db.prepare("insert into t values (?)")?;
    binder.bind(1)?;
    assert!(binder.bind(2).is_err());
    assert!(binder.is_finalized());
    assert!(matches!(binder.execute(), Err(SqlStreamError::Finalized)));
    drop(binder);

    assert_eq!(count(&db, "t")?, 0);
    assert_eq!(db.suppressed_error_count(), 0);
    Ok(())
}
