use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use dailyspend_auth::{Hs256Tokens, JwtValidator, PasswordHasher, Role, Session};
use dailyspend_core::{AccountId, Clock, ExpenseId, FixedClock, Money};

use super::{LedgerService, ServiceError};
use crate::store::InMemoryStore;

struct Harness {
    service: LedgerService,
    tokens: Arc<Hs256Tokens>,
    clock: Arc<FixedClock>,
}

impl Harness {
    fn new() -> Self {
        let tokens = Arc::new(Hs256Tokens::new(b"service-test-secret"));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        let service = LedgerService::new(
            Arc::new(InMemoryStore::new()),
            PasswordHasher::new(8),
            tokens.clone(),
            clock.clone(),
        );
        Self { service, tokens, clock }
    }

    async fn register(&self, username: &str, password: &str) -> Session {
        let auth = self.service.register(username, password).await.unwrap();
        self.session(&auth.token.token)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let auth = self.service.login(username, password).await?;
        Ok(self.session(&auth.token.token))
    }

    async fn admin(&self) -> Session {
        self.service.ensure_admin("root", "rootpw").await.unwrap();
        self.login("root", "rootpw").await.unwrap()
    }

    fn session(&self, token: &str) -> Session {
        self.tokens.validate(token, self.clock.now()).unwrap()
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn register_then_login_round_trips_identity() {
    let h = Harness::new();
    let registered = h.service.register("  alice ", "pw1234").await.unwrap();
    assert_eq!(registered.account.username, "alice");
    assert_eq!(registered.account.role, Role::User);
    assert_eq!(registered.budget_today, Money::ZERO);

    let session = h.login("alice", "pw1234").await.unwrap();
    assert_eq!(session.account_id(), registered.account.id);
    assert_eq!(session.username(), "alice");
    assert_eq!(session.expires_at(), h.clock.now() + chrono::Duration::days(7));
}

#[tokio::test]
async fn duplicate_registration_fails() {
    let h = Harness::new();
    h.register("alice", "pw1234").await;
    let err = h.service.register("alice", "other").await.unwrap_err();
    assert_eq!(err, ServiceError::DuplicateUsername);
}

#[tokio::test]
async fn registration_requires_username_and_password() {
    let h = Harness::new();
    assert!(matches!(h.service.register("   ", "pw").await, Err(ServiceError::InvalidInput(_))));
    assert!(matches!(h.service.register("bob", "").await, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn login_distinguishes_unknown_user_from_wrong_password() {
    let h = Harness::new();
    h.register("alice", "pw1234").await;

    assert_eq!(h.login("alice", "nope").await.unwrap_err(), ServiceError::InvalidCredential);
    assert_eq!(h.login("nobody", "pw1234").await.unwrap_err(), ServiceError::NotFound);
    assert_eq!(h.login("ALICE", "pw1234").await.unwrap_err(), ServiceError::NotFound);
}

#[tokio::test]
async fn added_expense_is_listed_verbatim() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;

    let added = h
        .service
        .add_expense(&s, "coffee", 4.75, Some(date(2024, 1, 1)))
        .await
        .unwrap();
    let listed = h.service.list_expenses(&s, None).await.unwrap();

    assert_eq!(listed, vec![added.clone()]);
    assert_eq!(added.description, "coffee");
    assert_eq!(added.amount, Money::from_cents(475));
    assert_eq!(added.date, date(2024, 1, 1));
}

#[tokio::test]
async fn expense_date_defaults_to_today() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    let e = h.service.add_expense(&s, "bus", 2.0, None).await.unwrap();
    assert_eq!(e.date, h.clock.today());
}

#[tokio::test]
async fn invalid_expenses_are_rejected() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;

    assert!(matches!(
        h.service.add_expense(&s, "", 5.0, None).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.add_expense(&s, "coffee", 0.0, None).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(h.service.list_expenses(&s, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn foreign_or_missing_expense_delete_is_not_found() {
    let h = Harness::new();
    let alice = h.register("alice", "pw1234").await;
    let bob = h.register("bob", "pw5678").await;

    let e = h.service.add_expense(&alice, "lunch", 10.0, None).await.unwrap();

    assert_eq!(h.service.delete_expense(&bob, e.id).await, Err(ServiceError::NotFound));
    assert_eq!(
        h.service.delete_expense(&alice, ExpenseId::new()).await,
        Err(ServiceError::NotFound)
    );
    assert_eq!(h.service.list_expenses(&alice, None).await.unwrap().len(), 1);

    h.service.delete_expense(&alice, e.id).await.unwrap();
    assert!(h.service.list_expenses(&alice, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn worked_example_summary() {
    let h = Harness::new();
    h.service.register("alice", "pw1234").await.unwrap();
    let t = h.login("alice", "pw1234").await.unwrap();
    let day = date(2024, 1, 1);

    h.service.add_expense(&t, "coffee", 50.0, Some(day)).await.unwrap();
    h.service.add_expense(&t, "lunch", 150.0, Some(day)).await.unwrap();
    let (budget_day, total) = h.service.add_budget(&t, 300.0, Some(day)).await.unwrap();
    assert_eq!(budget_day, day);
    assert_eq!(total, Money::from_cents(30_000));

    let s = h.service.summarize(&t, Some(day)).await.unwrap();
    assert_eq!(s.budget, Money::from_cents(30_000));
    assert_eq!(s.spent, Money::from_cents(20_000));
    assert_eq!(s.remaining, Money::from_cents(10_000));
}

#[tokio::test]
async fn budgets_accumulate_and_clear_per_date() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;

    let (_, first) = h.service.add_budget(&s, 20.0, None).await.unwrap();
    let (today, second) = h.service.add_budget(&s, 5.5, None).await.unwrap();
    assert_eq!(first, Money::from_cents(2000));
    assert_eq!(second, Money::from_cents(2550));
    assert_eq!(today, h.clock.today());

    h.service.add_budget(&s, 9.0, Some(date(2024, 1, 2))).await.unwrap();
    h.service.clear_budget(&s, None).await.unwrap();

    let profile = h.service.profile(&s).await.unwrap();
    assert_eq!(profile.budget_today, Money::ZERO);
    assert_eq!(profile.budgets.get(date(2024, 1, 2)), Money::from_cents(900));
}

#[tokio::test]
async fn non_positive_budget_is_rejected() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    let err = h.service.add_budget(&s, 0.0, None).await.unwrap_err();
    assert_eq!(err, ServiceError::InvalidInput("budget must be greater than zero".into()));
}

#[tokio::test]
async fn oversized_entries_are_rejected() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    let too_much = Money::MAX_ENTRY.as_major() + 1.0;

    let err = h.service.add_budget(&s, too_much, None).await.unwrap_err();
    assert_eq!(err, ServiceError::InvalidInput("amount must be at most 1000000000.00".into()));
    assert!(matches!(
        h.service.add_expense(&s, "yacht", too_much, None).await,
        Err(ServiceError::InvalidInput(_))
    ));

    let (_, total) = h.service.add_budget(&s, Money::MAX_ENTRY.as_major(), None).await.unwrap();
    assert_eq!(total, Money::MAX_ENTRY);
}

#[tokio::test]
async fn reset_today_and_clear_all() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    let yesterday = date(2023, 12, 31);

    h.service.add_budget(&s, 10.0, None).await.unwrap();
    h.service.add_budget(&s, 10.0, Some(yesterday)).await.unwrap();
    h.service.add_expense(&s, "today", 1.0, None).await.unwrap();
    h.service.add_expense(&s, "yesterday", 1.0, Some(yesterday)).await.unwrap();

    h.service.reset_today(&s).await.unwrap();
    let left = h.service.list_expenses(&s, None).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].description, "yesterday");
    let profile = h.service.profile(&s).await.unwrap();
    assert_eq!(profile.budget_today, Money::ZERO);
    assert_eq!(profile.budgets.get(yesterday), Money::from_cents(1000));

    h.service.clear_all(&s).await.unwrap();
    let profile = h.service.profile(&s).await.unwrap();
    assert!(profile.expenses.is_empty());
    assert!(profile.budgets.is_empty());
}

#[tokio::test]
async fn login_reports_todays_budget() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    h.service.add_budget(&s, 42.0, None).await.unwrap();

    let auth = h.service.login("alice", "pw1234").await.unwrap();
    assert_eq!(auth.budget_today, Money::from_cents(4200));
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;

    assert_eq!(
        h.service.change_password(&s, "wrong", "newpass").await,
        Err(ServiceError::InvalidCredential)
    );
    assert!(matches!(
        h.service.change_password(&s, "pw1234", "abc").await,
        Err(ServiceError::InvalidInput(_))
    ));

    h.service.change_password(&s, "pw1234", "newpass").await.unwrap();
    assert_eq!(h.login("alice", "pw1234").await.unwrap_err(), ServiceError::InvalidCredential);
    assert!(h.login("alice", "newpass").await.is_ok());
}

#[tokio::test]
async fn delete_own_account_reauthenticates() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;
    h.service.add_expense(&s, "x", 1.0, None).await.unwrap();

    assert_eq!(
        h.service.delete_own_account(&s, "wrong").await,
        Err(ServiceError::InvalidCredential)
    );
    h.service.delete_own_account(&s, "pw1234").await.unwrap();

    assert_eq!(h.login("alice", "pw1234").await.unwrap_err(), ServiceError::NotFound);
    assert_eq!(h.service.list_expenses(&s, None).await, Err(ServiceError::NotFound));
}

#[tokio::test]
async fn admin_operations_require_admin_role() {
    let h = Harness::new();
    let s = h.register("alice", "pw1234").await;

    assert!(matches!(h.service.list_accounts(&s).await, Err(ServiceError::Forbidden)));
    assert_eq!(
        h.service.rename_account(&s, s.account_id(), "x").await,
        Err(ServiceError::Forbidden)
    );
    assert_eq!(
        h.service.reset_password(&s, s.account_id(), "abcd").await,
        Err(ServiceError::Forbidden)
    );
    assert_eq!(h.service.delete_account(&s, s.account_id()).await, Err(ServiceError::Forbidden));
}

#[tokio::test]
async fn ensure_admin_creates_then_promotes() {
    let h = Harness::new();
    let created = h.service.ensure_admin("root", "rootpw").await.unwrap();
    assert_eq!(created.role, Role::Admin);

    let again = h.service.ensure_admin("root", "rootpw").await.unwrap();
    assert_eq!(again.id, created.id);
    assert!(h.login("root", "rootpw").await.is_ok());

    let s = h.register("carol", "pw1234").await;
    let promoted = h.service.ensure_admin("carol", "pw1234").await.unwrap();
    assert_eq!(promoted.id, s.account_id());
    assert_eq!(promoted.role, Role::Admin);
    assert_eq!(h.login("carol", "pw1234").await.unwrap().role(), Role::Admin);
}

#[tokio::test]
async fn ensure_admin_replaces_a_squatters_password() {
    let h = Harness::new();
    let squatter = h.register("root", "attackerpw").await;

    let admin = h.service.ensure_admin("root", "rootpw").await.unwrap();
    assert_eq!(admin.id, squatter.account_id());

    assert_eq!(h.login("root", "attackerpw").await.unwrap_err(), ServiceError::InvalidCredential);
    assert_eq!(h.login("root", "rootpw").await.unwrap().role(), Role::Admin);
}

#[tokio::test]
async fn ensure_admin_restores_a_changed_password() {
    let h = Harness::new();
    let admin = h.admin().await;
    h.service.change_password(&admin, "rootpw", "other").await.unwrap();

    h.service.ensure_admin("root", "rootpw").await.unwrap();
    assert!(h.login("root", "rootpw").await.is_ok());
    assert_eq!(h.login("root", "other").await.unwrap_err(), ServiceError::InvalidCredential);
}

#[tokio::test]
async fn promoted_account_needs_a_fresh_token_for_admin_calls() {
    let h = Harness::new();
    let before = h.register("root", "userpw").await;
    h.service.ensure_admin("root", "rootpw").await.unwrap();

    assert!(matches!(h.service.list_accounts(&before).await, Err(ServiceError::Forbidden)));
    let after = h.login("root", "rootpw").await.unwrap();
    assert!(h.service.list_accounts(&after).await.is_ok());
}

#[tokio::test]
async fn deleted_admin_token_loses_admin_rights() {
    let h = Harness::new();
    let admin = h.admin().await;
    let bob = h.register("bob", "pw5678").await;

    h.service.delete_own_account(&admin, "rootpw").await.unwrap();

    assert!(matches!(h.service.list_accounts(&admin).await, Err(ServiceError::NotFound)));
    assert_eq!(
        h.service.rename_account(&admin, bob.account_id(), "robert").await,
        Err(ServiceError::NotFound)
    );
    assert_eq!(
        h.service.reset_password(&admin, bob.account_id(), "abcd").await,
        Err(ServiceError::NotFound)
    );
    assert_eq!(
        h.service.delete_account(&admin, bob.account_id()).await,
        Err(ServiceError::NotFound)
    );
    assert!(h.login("bob", "pw5678").await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_logins_on_a_multi_thread_runtime() {
    let h = Arc::new(Harness::new());
    h.register("alice", "pw1234").await;

    let logins: Vec<_> = (0..4)
        .map(|_| {
            let h = h.clone();
            tokio::spawn(async move { h.service.login("alice", "pw1234").await })
        })
        .collect();
    for login in logins {
        assert!(login.await.unwrap().is_ok());
    }
}

#[tokio::test]
async fn admin_listing_reports_totals() {
    let h = Harness::new();
    let admin = h.admin().await;
    let alice = h.register("alice", "pw1234").await;
    let bob = h.register("bob", "pw5678").await;

    h.service.add_budget(&alice, 100.0, None).await.unwrap();
    h.service.add_expense(&alice, "a", 30.0, None).await.unwrap();
    h.service.add_expense(&alice, "b", 20.0, None).await.unwrap();
    h.service.add_expense(&bob, "c", 5.0, None).await.unwrap();

    let listing = h.service.list_accounts(&admin).await.unwrap();
    assert_eq!(listing.totals.accounts, 3);
    assert_eq!(listing.totals.expenses, 3);
    assert_eq!(listing.totals.spent, Money::from_cents(5500));

    let row = listing.accounts.iter().find(|r| r.username == "alice").unwrap();
    assert_eq!(row.expense_count, 2);
    assert_eq!(row.total_spent, Money::from_cents(5000));
    assert_eq!(row.total_budget, Money::from_cents(10_000));
    assert_eq!(row.remaining, Money::from_cents(5000));
}

#[tokio::test]
async fn admin_rename_keeps_ledger_linked() {
    let h = Harness::new();
    let admin = h.admin().await;
    let alice = h.register("alice", "pw1234").await;
    h.register("bob", "pw5678").await;
    h.service.add_expense(&alice, "x", 1.0, None).await.unwrap();

    let id = alice.account_id();
    assert!(matches!(
        h.service.rename_account(&admin, id, "  ").await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.rename_account(&admin, id, "alice").await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert_eq!(
        h.service.rename_account(&admin, id, "bob").await,
        Err(ServiceError::DuplicateUsername)
    );
    assert_eq!(
        h.service.rename_account(&admin, AccountId::new(), "zed").await,
        Err(ServiceError::NotFound)
    );

    h.service.rename_account(&admin, id, "alicia").await.unwrap();
    assert_eq!(h.login("alice", "pw1234").await.unwrap_err(), ServiceError::NotFound);
    let renamed = h.login("alicia", "pw1234").await.unwrap();
    assert_eq!(renamed.account_id(), id);
    assert_eq!(h.service.list_expenses(&renamed, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_reset_password_skips_reauthentication() {
    let h = Harness::new();
    let admin = h.admin().await;
    let alice = h.register("alice", "pw1234").await;

    assert!(matches!(
        h.service.reset_password(&admin, alice.account_id(), "abc").await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert_eq!(
        h.service.reset_password(&admin, AccountId::new(), "abcd").await,
        Err(ServiceError::NotFound)
    );

    h.service.reset_password(&admin, alice.account_id(), "fresh").await.unwrap();
    assert_eq!(h.login("alice", "pw1234").await.unwrap_err(), ServiceError::InvalidCredential);
    assert!(h.login("alice", "fresh").await.is_ok());
}

#[tokio::test]
async fn admin_delete_cascades_and_blocks_login() {
    let h = Harness::new();
    let admin = h.admin().await;
    let alice = h.register("alice", "pw1234").await;
    h.service.add_expense(&alice, "x", 1.0, None).await.unwrap();
    h.service.add_budget(&alice, 10.0, None).await.unwrap();

    h.service.delete_account(&admin, alice.account_id()).await.unwrap();

    assert_eq!(h.login("alice", "pw1234").await.unwrap_err(), ServiceError::NotFound);
    assert_eq!(
        h.service.delete_account(&admin, alice.account_id()).await,
        Err(ServiceError::NotFound)
    );
    let listing = h.service.list_accounts(&admin).await.unwrap();
    assert_eq!(listing.totals.accounts, 1);
    assert_eq!(listing.totals.expenses, 0);

    // The name is free again and starts with an empty ledger.
    let again = h.register("alice", "pw1234").await;
    assert!(h.service.list_expenses(&again, None).await.unwrap().is_empty());
}
