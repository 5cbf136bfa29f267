use userstore_core::db::open_db_in_memory;
use userstore_core::{SqliteUserDao, User, UserDao, UserService};

#[test]
fn user_name_of_missing_user_is_none() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserDao::try_new(&conn).unwrap());

    assert_eq!(service.user_name("id").unwrap(), None);
}

#[test]
fn update_user_name_creates_active_user_when_missing() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserDao::try_new(&conn).unwrap());

    let stored = service.update_user_name("id", "fresh").unwrap();

    assert_eq!(stored, User::with_id("id", "fresh", true));
    assert_eq!(service.user_name("id").unwrap().as_deref(), Some("fresh"));
}

#[test]
fn update_user_name_keeps_active_flag() {
    let conn = open_db_in_memory().unwrap();
    let dao = SqliteUserDao::try_new(&conn).unwrap();
    dao.insert_user(&User::with_id("id", "username", false))
        .unwrap();
    let service = UserService::new(&dao);

    service.update_user_name("id", "new username").unwrap();

    let loaded = dao.get_user_by_id("id").unwrap().unwrap();
    assert_eq!(loaded.user_name, "new username");
    assert!(!loaded.is_active);
    assert_eq!(service.dao().count_users().unwrap(), 1);
}

#[test]
fn update_user_name_rejects_blank_id() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserDao::try_new(&conn).unwrap());

    assert!(service.update_user_name("", "nobody").is_err());
    assert_eq!(service.dao().count_users().unwrap(), 0);
}
