//! Postgres store tests. They run only when `DATABASE_URL` points at a
//! scratch database; otherwise each test returns early.

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use dailyspend_auth::{PasswordHash, Role};
use dailyspend_core::{AccountId, ExpenseId, Money};
use dailyspend_infra::{AccountStore, LedgerStore, PostgresStore, StoreError};
use dailyspend_ledger::{Account, Expense};

async fn store() -> Option<PostgresStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let store = PostgresStore::connect(&url).await.expect("connect to DATABASE_URL");
    store.migrate().await.expect("migrate schema");
    Some(store)
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7().simple())
}

fn account(username: &str) -> Account {
    Account::new(
        username.to_string(),
        PasswordHash::from_stored("sha256$1$00$00"),
        Role::User,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn expense(description: &str, date: NaiveDate) -> Expense {
    // Whole microseconds so the TIMESTAMPTZ round trip is exact.
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
    Expense::record(description, 2.5, Some(date), now).unwrap()
}

#[tokio::test]
async fn account_lifecycle() {
    let Some(store) = store().await else { return };
    let name = unique_name("alice");
    let a = account(&name);

    store.insert_account(&a).await.unwrap();
    assert_eq!(
        store.insert_account(&account(&name)).await,
        Err(StoreError::DuplicateUsername(name.clone()))
    );

    let loaded = store.find_by_username(&name).await.unwrap().unwrap();
    assert_eq!(loaded.id, a.id);
    assert_eq!(loaded.role, Role::User);
    assert_eq!(loaded.password_hash, a.password_hash);

    store.set_role(a.id, Role::Admin).await.unwrap();
    assert_eq!(store.get_account(a.id).await.unwrap().unwrap().role, Role::Admin);

    let renamed = unique_name("alicia");
    store.rename_account(a.id, &renamed).await.unwrap();
    assert!(store.find_by_username(&name).await.unwrap().is_none());
    assert_eq!(store.find_by_username(&renamed).await.unwrap().unwrap().id, a.id);

    store.delete_account(a.id).await.unwrap();
    assert!(store.get_account(a.id).await.unwrap().is_none());
    assert_eq!(store.delete_account(a.id).await, Err(StoreError::NotFound));
    assert_eq!(store.rename_account(AccountId::new(), "x").await, Err(StoreError::NotFound));
}

#[tokio::test]
async fn budgets_accumulate_in_one_statement() {
    let Some(store) = store().await else { return };
    let a = account(&unique_name("budget"));
    store.insert_account(&a).await.unwrap();

    assert_eq!(store.add_budget(a.id, day(1), Money::from_cents(1000)).await.unwrap(), Money::from_cents(1000));
    assert_eq!(store.add_budget(a.id, day(1), Money::from_cents(250)).await.unwrap(), Money::from_cents(1250));
    store.add_budget(a.id, day(2), Money::from_cents(100)).await.unwrap();

    store.clear_budget(a.id, day(2)).await.unwrap();
    let book = store.budgets(a.id).await.unwrap();
    assert_eq!(book.get(day(1)), Money::from_cents(1250));
    assert_eq!(book.get(day(2)), Money::ZERO);

    // Foreign key: budgets for an unknown account are rejected.
    assert_eq!(
        store.add_budget(AccountId::new(), day(1), Money::from_cents(1)).await,
        Err(StoreError::NotFound)
    );

    store.delete_account(a.id).await.unwrap();
}

#[tokio::test]
async fn budget_upsert_saturates_like_in_memory() {
    let Some(store) = store().await else { return };
    let a = account(&unique_name("saturate"));
    store.insert_account(&a).await.unwrap();

    let near_max = Money::from_cents(i64::MAX - 10);
    store.add_budget(a.id, day(1), near_max).await.unwrap();
    let total = store.add_budget(a.id, day(1), Money::MAX_ENTRY).await.unwrap();
    assert_eq!(total, Money::from_cents(i64::MAX));

    let mut book = dailyspend_ledger::BudgetBook::new();
    book.add(day(1), near_max);
    assert_eq!(book.add(day(1), Money::MAX_ENTRY), total);

    store.delete_account(a.id).await.unwrap();
}

#[tokio::test]
async fn expenses_are_scoped_and_newest_first() {
    let Some(store) = store().await else { return };
    let a = account(&unique_name("owner"));
    let b = account(&unique_name("other"));
    store.insert_account(&a).await.unwrap();
    store.insert_account(&b).await.unwrap();

    let first = expense("first", day(1));
    let second = expense("second", day(2));
    let third = expense("third", day(1));
    for e in [&first, &second, &third] {
        store.insert_expense(a.id, e).await.unwrap();
    }

    let all = store.list_expenses(a.id, None).await.unwrap();
    assert_eq!(all, vec![third.clone(), second.clone(), first.clone()]);

    let filtered = store.list_expenses(a.id, Some(day(2))).await.unwrap();
    assert_eq!(filtered, vec![second.clone()]);

    assert_eq!(store.delete_expense(b.id, first.id).await, Err(StoreError::NotFound));
    assert_eq!(store.delete_expense(a.id, ExpenseId::new()).await, Err(StoreError::NotFound));
    store.delete_expense(a.id, first.id).await.unwrap();

    store.add_budget(a.id, day(1), Money::from_cents(500)).await.unwrap();
    store.clear_day(a.id, day(1)).await.unwrap();
    assert_eq!(store.list_expenses(a.id, None).await.unwrap(), vec![second]);
    assert!(store.budgets(a.id).await.unwrap().is_empty());

    store.add_budget(a.id, day(3), Money::from_cents(500)).await.unwrap();
    store.clear_ledger(a.id).await.unwrap();
    assert!(store.list_expenses(a.id, None).await.unwrap().is_empty());
    assert!(store.budgets(a.id).await.unwrap().is_empty());

    store.delete_account(a.id).await.unwrap();
    store.delete_account(b.id).await.unwrap();
}

#[tokio::test]
async fn deleting_an_account_cascades() {
    let Some(store) = store().await else { return };
    let a = account(&unique_name("cascade"));
    store.insert_account(&a).await.unwrap();
    store.insert_expense(a.id, &expense("x", day(1))).await.unwrap();
    store.add_budget(a.id, day(1), Money::from_cents(100)).await.unwrap();

    store.delete_account(a.id).await.unwrap();

    assert!(store.list_expenses(a.id, None).await.unwrap().is_empty());
    assert!(store.budgets(a.id).await.unwrap().is_empty());
}
