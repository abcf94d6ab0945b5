use sql_stream::prelude::*;

#[test]
fn null_reads_as_zero_or_empty() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();

    let mut i = 99i32;
    ((&db << "select null") >> &mut i)?;
    assert_eq!(i, 0);

    let mut big = 99i64;
    ((&db << "select null") >> &mut big)?;
    assert_eq!(big, 0);

    let mut f = 9.5f64;
    ((&db << "select null") >> &mut f)?;
    assert_eq!(f, 0.0);

    let mut s = String::from("old");
    ((&db << "select null") >> &mut s)?;
    assert!(s.is_empty());

    let mut w = WideString::from("old");
    ((&db << "select null") >> &mut w)?;
    assert!(w.is_empty());
    Ok(())
}

#[test]
fn null_columns_in_callbacks_collapse_too() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table t(a int, b text, c real)")?;
    (&db << "insert into t values (?,?,?)" << None::<i64> << None::<String> << None::<f64>)
        .execute()?;

    let mut row = None;
    ((&db << "select a, b, c from t") >> rows(|a: i32, b: String, c: f64| row = Some((a, b, c))))?;
    assert_eq!(row, Some((0, String::new(), 0.0)));
    Ok(())
}

#[test]
fn option_receivers_tell_null_from_zero() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open_in_memory();
    db.execute_batch("create table t(a int); insert into t values (0), (null);")?;

    let mut seen = Vec::new();
    ((&db << "select a from t order by rowid") >> rows(|a: Option<i64>| seen.push(a)))?;
    assert_eq!(seen, vec![Some(0), None]);

    let mut plain = Vec::new();
    ((&db << "select a from t order by rowid") >> rows(|a: i64| plain.push(a)))?;
    assert_eq!(plain, vec![0, 0]);
    Ok(())
}
