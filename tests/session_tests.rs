// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneybook::commands::users;
use moneybook::db;
use moneybook::errors::LedgerError;
use moneybook::utils::{current_session, set_current_user};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

#[test]
fn no_selected_user_means_unauthenticated() {
    let conn = setup();
    let err = current_session(&conn).unwrap_err();
    assert!(matches!(err, LedgerError::Auth));
}

#[test]
fn selecting_an_unknown_user_is_not_found() {
    let conn = setup();
    let err = set_current_user(&conn, "nobody").unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
}

#[test]
fn selected_user_resolves_to_a_session() {
    let conn = setup();
    let id = users::create(&conn, "alice").unwrap();
    set_current_user(&conn, "alice").unwrap();
    let session = current_session(&conn).unwrap();
    assert_eq!(session.user_id, id);
}

#[test]
fn session_follows_the_latest_selection() {
    let conn = setup();
    users::create(&conn, "alice").unwrap();
    let bob = users::create(&conn, "bob").unwrap();
    set_current_user(&conn, "alice").unwrap();
    set_current_user(&conn, "bob").unwrap();
    assert_eq!(current_session(&conn).unwrap().user_id, bob);
}

#[test]
fn dangling_selection_is_unauthenticated() {
    let conn = setup();
    users::create(&conn, "alice").unwrap();
    set_current_user(&conn, "alice").unwrap();
    conn.execute("DELETE FROM users WHERE name='alice'", [])
        .unwrap();
    let err = current_session(&conn).unwrap_err();
    assert!(matches!(err, LedgerError::Auth));
}

#[test]
fn blank_user_names_are_rejected() {
    let conn = setup();
    let err = users::create(&conn, "  ").unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}
