use staffdb_core::db::{ensure_schema, open_db_in_memory};
use staffdb_core::{
    default_seed_rows, Employee, EmployeeMutator, EmployeeRepository,
    EmployeeValidationError, InsertOutcome, RepoError, SeedGuard, SeedPolicy,
    SqliteEmployeeRepository, UpdateOutcome,
};
use rusqlite::Connection;

fn seeded_db() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    SeedGuard::new(&mut conn)
        .ensure_seed(&default_seed_rows(), SeedPolicy::IfEmpty)
        .unwrap();
    conn
}

fn salary_of(conn: &Connection, id: i64) -> Option<i64> {
    SqliteEmployeeRepository::new(conn)
        .find_by_key(id)
        .unwrap()
        .unwrap()
        .salary
}

#[test]
fn update_salary_reports_verified_before_and_after() {
    let mut conn = seeded_db();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(1, 60000);

    match outcome {
        UpdateOutcome::Success { before, after } => {
            assert_eq!(before.salary, Some(75000));
            assert_eq!(after.salary, Some(60000));
            assert_eq!(after.first_name, before.first_name);
            assert_eq!(after.last_name, before.last_name);
            assert_eq!(after.department, before.department);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(salary_of(&conn, 1), Some(60000));
    assert!(conn.is_autocommit());
}

#[test]
fn update_salary_to_same_value_succeeds() {
    let mut conn = seeded_db();
    let outcome = EmployeeMutator::new(&mut conn).update_salary(2, 65000);
    assert!(outcome.is_success());
    assert_eq!(salary_of(&conn, 2), Some(65000));
}

#[test]
fn update_salary_for_missing_key_is_not_found() {
    let mut conn = seeded_db();
    let before = SqliteEmployeeRepository::new(&conn).find_all().unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(99, 1);

    assert!(matches!(outcome, UpdateOutcome::NotFound { employee_id: 99 }));
    assert!(outcome.before().is_none());
    assert!(outcome.after().is_none());
    assert!(conn.is_autocommit());
    assert_eq!(SqliteEmployeeRepository::new(&conn).find_all().unwrap(), before);
}

#[test]
fn update_salary_not_found_does_not_need_write_access() {
    let mut conn = seeded_db();
    conn.execute_batch("PRAGMA query_only = ON;").unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(99, 1);

    assert!(matches!(outcome, UpdateOutcome::NotFound { .. }));
}

#[test]
fn zero_affected_rows_is_rolled_back_as_concurrent_modification() {
    let mut conn = seeded_db();
    // Silently drops the write so the UPDATE reports zero changed rows.
    conn.execute_batch(
        "CREATE TRIGGER drop_salary_writes
         BEFORE UPDATE OF salary ON employees
         BEGIN
             SELECT RAISE(IGNORE);
         END;",
    )
    .unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(1, 60000);

    match &outcome {
        UpdateOutcome::ConcurrentModification { before, observed } => {
            assert_eq!(before.salary, Some(75000));
            assert!(observed.is_none());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.before().and_then(|row| row.salary), Some(75000));
    assert_eq!(salary_of(&conn, 1), Some(75000));
    assert!(conn.is_autocommit());
}

#[test]
fn diverging_post_image_is_rolled_back() {
    let mut conn = seeded_db();
    conn.execute_batch(
        "CREATE TRIGGER rename_on_salary_change
         AFTER UPDATE OF salary ON employees
         BEGIN
             UPDATE employees SET last_name = 'Changed'
             WHERE employee_id = NEW.employee_id;
         END;",
    )
    .unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(1, 60000);

    match outcome {
        UpdateOutcome::ConcurrentModification { observed, .. } => {
            assert_eq!(observed.unwrap().last_name, "Changed");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let stored = SqliteEmployeeRepository::new(&conn)
        .find_by_key(1)
        .unwrap()
        .unwrap();
    assert_eq!(stored.salary, Some(75000));
    assert_eq!(stored.last_name, "Doe");
}

#[test]
fn storage_error_during_write_rolls_back_and_keeps_cause() {
    let mut conn = seeded_db();
    conn.execute_batch(
        "CREATE TRIGGER reject_salary_writes
         BEFORE UPDATE OF salary ON employees
         BEGIN
             SELECT RAISE(ABORT, 'salary writes are frozen');
         END;",
    )
    .unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(3, 1);

    match outcome {
        UpdateOutcome::StorageError { before, cause } => {
            assert_eq!(before.unwrap().salary, Some(55000));
            assert!(matches!(cause, RepoError::Db(_)));
            assert!(cause.to_string().contains("salary writes are frozen"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(salary_of(&conn, 3), Some(55000));
    assert!(conn.is_autocommit());
}

#[test]
fn storage_error_during_pre_read_has_no_pre_image() {
    let mut conn = open_db_in_memory().unwrap();

    let outcome = EmployeeMutator::new(&mut conn).update_salary(1, 1);

    match outcome {
        UpdateOutcome::StorageError { before, .. } => assert!(before.is_none()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn insert_employee_returns_stored_row() {
    let mut conn = open_db_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    let alice = Employee::new(3, "Alice", "Smith")
        .with_department("IT")
        .with_salary(55000);

    let outcome = EmployeeMutator::new(&mut conn).insert_employee(&alice);

    match outcome {
        InsertOutcome::Success(stored) => assert_eq!(stored, alice),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        SqliteEmployeeRepository::new(&conn).find_by_key(3).unwrap(),
        Some(alice)
    );
}

#[test]
fn duplicate_insert_is_rejected_and_original_row_kept() {
    let mut conn = seeded_db();
    let original = SqliteEmployeeRepository::new(&conn)
        .find_by_key(3)
        .unwrap()
        .unwrap();
    let impostor = Employee::new(3, "Mallory", "Jones")
        .with_department("Sales")
        .with_salary(999_999);

    let outcome = EmployeeMutator::new(&mut conn).insert_employee(&impostor);

    assert!(matches!(outcome, InsertOutcome::DuplicateKey(3)));
    assert_eq!(
        SqliteEmployeeRepository::new(&conn).find_by_key(3).unwrap(),
        Some(original)
    );
    assert_eq!(SqliteEmployeeRepository::new(&conn).count().unwrap(), 5);
    assert!(conn.is_autocommit());
}

#[test]
fn invalid_insert_is_rejected_before_sql() {
    let mut conn = open_db_in_memory().unwrap();

    // No schema: any SQL would fail, so a `Rejected` outcome proves none ran.
    let outcome = EmployeeMutator::new(&mut conn).insert_employee(&Employee::new(8, "", "Doe"));

    assert!(matches!(
        outcome,
        InsertOutcome::Rejected(EmployeeValidationError::BlankFirstName(8))
    ));
}

#[test]
fn insert_storage_failure_is_not_a_duplicate() {
    let mut conn = open_db_in_memory().unwrap();

    let outcome =
        EmployeeMutator::new(&mut conn).insert_employee(&Employee::new(8, "Grace", "Hopper"));

    assert!(matches!(outcome, InsertOutcome::StorageError(RepoError::Db(_))));
    assert!(conn.is_autocommit());
}

#[test]
fn find_all_orders_by_key_and_reports_columns() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    let repo = SqliteEmployeeRepository::new(&conn);
    for id in [5, 1, 3] {
        repo.insert(&Employee::new(id, format!("First{id}"), "Last"))
            .unwrap();
    }

    let table = repo.find_all().unwrap();

    assert_eq!(
        table.columns,
        vec!["employee_id", "first_name", "last_name", "department", "salary"]
    );
    let ids = table.rows.iter().map(|row| row.employee_id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn find_all_on_empty_table_is_empty_not_error() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn).unwrap();

    let table = SqliteEmployeeRepository::new(&conn).find_all().unwrap();

    assert!(table.is_empty());
    assert_eq!(table.columns.len(), 5);
    assert!(SqliteEmployeeRepository::new(&conn)
        .find_by_key(1)
        .unwrap()
        .is_none());
}

#[test]
fn read_failure_is_distinct_from_no_rows() {
    let conn = open_db_in_memory().unwrap();

    let err = SqliteEmployeeRepository::new(&conn).find_all().unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn invalid_persisted_rows_are_reported() {
    let conn = open_db_in_memory().unwrap();
    ensure_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO employees (employee_id, first_name, last_name) VALUES (1, ' ', 'Doe');",
        [],
    )
    .unwrap();

    let err = SqliteEmployeeRepository::new(&conn)
        .find_by_key(1)
        .unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(_)));
}
