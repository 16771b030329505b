//! Clients, tasks and payments: ownership, quotas and cross-entity rules

mod common;

use chrono::{Duration, Utc};
use common::{client_input, days_from_now, Harness};
use freelacrm_shared::error::ServiceError;
use freelacrm_shared::models::client::ClientStatus;
use freelacrm_shared::models::payment::{PaymentInput, PaymentStatus};
use freelacrm_shared::models::task::{TaskInput, TaskStatus};
use freelacrm_shared::models::user::UserPlan;
use freelacrm_shared::store::PageRequest;
use uuid::Uuid;

fn task_input(client_id: Uuid, title: &str) -> TaskInput {
    TaskInput {
        client_id,
        title: title.to_string(),
        ..Default::default()
    }
}

fn payment_input(client_id: Uuid, task_id: Option<Uuid>, amount: f64) -> PaymentInput {
    PaymentInput {
        client_id,
        task_id,
        amount,
        currency: None,
        status: None,
        method: None,
        description: String::new(),
        invoice_number: String::new(),
        due_date: days_from_now(7),
        paid_date: None,
    }
}

#[tokio::test]
async fn test_free_plan_client_ceiling() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;

    for i in 1..=5 {
        h.client(&user, &format!("Client {i}")).await;
    }

    let sixth = h
        .services
        .clients
        .create(user.id, client_input("Client 6"))
        .await;
    assert!(matches!(
        sixth,
        Err(ServiceError::ClientLimitExceeded { limit: 5 })
    ));
}

#[tokio::test]
async fn test_soft_deleted_clients_free_quota_and_disappear() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;

    let mut clients = Vec::new();
    for i in 1..=5 {
        clients.push(h.client(&user, &format!("Client {i}")).await);
    }

    let gone = clients[0].id;
    h.services.clients.delete(user.id, gone).await.unwrap();

    assert!(matches!(
        h.services.clients.get(user.id, gone).await,
        Err(ServiceError::ClientNotFound)
    ));
    assert_eq!(h.services.clients.count(user.id).await.unwrap(), 4);

    let page = h
        .services
        .clients
        .list(user.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert!(page.items.iter().all(|c| c.id != gone));

    // Slot freed by the delete
    h.client(&user, "Replacement").await;
}

#[tokio::test]
async fn test_pro_plan_has_no_client_ceiling() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    h.set_plan(&user, UserPlan::Pro).await;

    for i in 1..=7 {
        h.client(&user, &format!("Client {i}")).await;
    }
    assert_eq!(h.services.clients.count(user.id).await.unwrap(), 7);
}

#[tokio::test]
async fn test_other_users_records_are_not_found() {
    let h = Harness::new();
    let owner = h.user("owner@example.com").await;
    let intruder = h.user("intruder@example.com").await;

    let client = h.client(&owner, "Acme").await;
    let task = h
        .services
        .tasks
        .create(owner.id, task_input(client.id, "Logo"))
        .await
        .unwrap();
    let payment = h
        .services
        .payments
        .create(owner.id, payment_input(client.id, Some(task.id), 250.0))
        .await
        .unwrap();

    assert!(matches!(
        h.services.clients.get(intruder.id, client.id).await,
        Err(ServiceError::ClientNotFound)
    ));
    assert!(matches!(
        h.services
            .clients
            .update(intruder.id, client.id, client_input("Hijacked"))
            .await,
        Err(ServiceError::ClientNotFound)
    ));
    assert!(matches!(
        h.services.clients.delete(intruder.id, client.id).await,
        Err(ServiceError::ClientNotFound)
    ));

    assert!(matches!(
        h.services.tasks.get(intruder.id, task.id).await,
        Err(ServiceError::TaskNotFound)
    ));
    assert!(matches!(
        h.services
            .tasks
            .change_status(intruder.id, task.id, TaskStatus::Completed)
            .await,
        Err(ServiceError::TaskNotFound)
    ));
    assert!(matches!(
        h.services.tasks.delete(intruder.id, task.id).await,
        Err(ServiceError::TaskNotFound)
    ));

    assert!(matches!(
        h.services.payments.get(intruder.id, payment.id).await,
        Err(ServiceError::PaymentNotFound)
    ));
    assert!(matches!(
        h.services.payments.mark_as_paid(intruder.id, payment.id, None).await,
        Err(ServiceError::PaymentNotFound)
    ));
    assert!(matches!(
        h.services.payments.delete(intruder.id, payment.id).await,
        Err(ServiceError::PaymentNotFound)
    ));

    // Nothing changed for the owner
    assert_eq!(h.services.clients.get(owner.id, client.id).await.unwrap().name, "Acme");
    assert_eq!(
        h.services.tasks.get(owner.id, task.id).await.unwrap().status,
        TaskStatus::Todo
    );
    assert_eq!(
        h.services.payments.get(owner.id, payment.id).await.unwrap().status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_task_requires_owned_active_client() {
    let h = Harness::new();
    let owner = h.user("owner@example.com").await;
    let other = h.user("other@example.com").await;
    let foreign = h.client(&other, "Foreign").await;

    let result = h
        .services
        .tasks
        .create(owner.id, task_input(foreign.id, "Nope"))
        .await;
    assert!(matches!(result, Err(ServiceError::ClientNotFound)));

    let mut input = client_input("Dormant");
    input.status = Some(ClientStatus::Inactive);
    let dormant = h.services.clients.create(owner.id, input).await.unwrap();

    let result = h
        .services
        .tasks
        .create(owner.id, task_input(dormant.id, "Nope"))
        .await;
    assert!(matches!(result, Err(ServiceError::ClientNotActive)));
}

#[tokio::test]
async fn test_todo_task_ceiling_counts_only_todo() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;

    let mut tasks = Vec::new();
    for i in 1..=10 {
        let task = h
            .services
            .tasks
            .create(user.id, task_input(client.id, &format!("Task {i}")))
            .await
            .unwrap();
        tasks.push(task);
    }

    let eleventh = h
        .services
        .tasks
        .create(user.id, task_input(client.id, "Task 11"))
        .await;
    assert!(matches!(
        eleventh,
        Err(ServiceError::TaskLimitExceeded { limit: 10 })
    ));

    h.services
        .tasks
        .change_status(user.id, tasks[0].id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert!(h
        .services
        .tasks
        .create(user.id, task_input(client.id, "Task 11"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_change_status_stamps_dates_once() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;
    let task = h
        .services
        .tasks
        .create(user.id, task_input(client.id, "Site"))
        .await
        .unwrap();
    assert!(task.start_date.is_none());

    let t1 = Utc::now();
    let started = h
        .services
        .tasks
        .change_status_at(user.id, task.id, TaskStatus::InProgress, t1)
        .await
        .unwrap();
    assert_eq!(started.start_date, Some(t1));
    assert!(started.end_date.is_none());

    let t2 = t1 + Duration::hours(3);
    let done = h
        .services
        .tasks
        .change_status_at(user.id, task.id, TaskStatus::Completed, t2)
        .await
        .unwrap();
    assert_eq!(done.start_date, Some(t1));
    assert_eq!(done.end_date, Some(t2));

    let t3 = t2 + Duration::hours(1);
    let reopened = h
        .services
        .tasks
        .change_status_at(user.id, task.id, TaskStatus::Review, t3)
        .await
        .unwrap();
    assert_eq!(reopened.start_date, Some(t1));
    assert_eq!(reopened.end_date, Some(t2));
}

#[tokio::test]
async fn test_upcoming_tasks_window() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;

    let mut soon = task_input(client.id, "Soon");
    soon.due_date = Some(days_from_now(2));
    let soon = h.services.tasks.create(user.id, soon).await.unwrap();

    let mut sooner = task_input(client.id, "Sooner");
    sooner.due_date = Some(days_from_now(1));
    let sooner = h.services.tasks.create(user.id, sooner).await.unwrap();

    let mut later = task_input(client.id, "Later");
    later.due_date = Some(days_from_now(30));
    h.services.tasks.create(user.id, later).await.unwrap();

    let mut finished = task_input(client.id, "Finished");
    finished.due_date = Some(days_from_now(1));
    let finished = h.services.tasks.create(user.id, finished).await.unwrap();
    h.services
        .tasks
        .change_status(user.id, finished.id, TaskStatus::Completed)
        .await
        .unwrap();

    let upcoming = h.services.tasks.upcoming(user.id, 7).await.unwrap();
    let ids: Vec<Uuid> = upcoming.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![sooner.id, soon.id]);

    assert!(matches!(
        h.services.tasks.upcoming(user.id, 0).await,
        Err(ServiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_list_tasks_by_status_and_client() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let acme = h.client(&user, "Acme").await;
    let globex = h.client(&user, "Globex").await;

    let a = h.services.tasks.create(user.id, task_input(acme.id, "A")).await.unwrap();
    h.services.tasks.create(user.id, task_input(acme.id, "B")).await.unwrap();
    h.services.tasks.create(user.id, task_input(globex.id, "C")).await.unwrap();
    h.services
        .tasks
        .change_status(user.id, a.id, TaskStatus::Review)
        .await
        .unwrap();

    let review = h
        .services
        .tasks
        .list(user.id, Some(TaskStatus::Review), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(review.total, 1);
    assert_eq!(review.items[0].id, a.id);

    let acme_tasks = h
        .services
        .tasks
        .list_by_client(user.id, acme.id, PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(acme_tasks.total, 2);
    assert_eq!(acme_tasks.items.len(), 1);
}

#[tokio::test]
async fn test_payment_task_must_match_client() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let acme = h.client(&user, "Acme").await;
    let globex = h.client(&user, "Globex").await;
    let task = h
        .services
        .tasks
        .create(user.id, task_input(acme.id, "Logo"))
        .await
        .unwrap();

    let result = h
        .services
        .payments
        .create(user.id, payment_input(globex.id, Some(task.id), 100.0))
        .await;
    assert!(matches!(result, Err(ServiceError::TaskClientMismatch)));

    let ok = h
        .services
        .payments
        .create(user.id, payment_input(acme.id, Some(task.id), 100.0))
        .await
        .unwrap();
    assert_eq!(ok.status, PaymentStatus::Pending);
    assert_eq!(ok.currency, "USD");

    let update = h
        .services
        .payments
        .update(user.id, ok.id, payment_input(globex.id, Some(task.id), 100.0))
        .await;
    assert!(matches!(update, Err(ServiceError::TaskClientMismatch)));

    let by_task = h.services.payments.list_by_task(user.id, task.id).await.unwrap();
    assert_eq!(by_task.len(), 1);
}

#[tokio::test]
async fn test_billed_task_cannot_move_to_another_client() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let acme = h.client(&user, "Acme").await;
    let globex = h.client(&user, "Globex").await;
    let task = h
        .services
        .tasks
        .create(user.id, task_input(acme.id, "Logo"))
        .await
        .unwrap();
    let payment = h
        .services
        .payments
        .create(user.id, payment_input(acme.id, Some(task.id), 100.0))
        .await
        .unwrap();

    let moved = h
        .services
        .tasks
        .update(user.id, task.id, task_input(globex.id, "Logo"))
        .await;
    assert!(matches!(moved, Err(ServiceError::TaskClientMismatch)));

    let task = h.services.tasks.get(user.id, task.id).await.unwrap();
    assert_eq!(task.client_id, acme.id);

    // Same client is still editable
    let renamed = h
        .services
        .tasks
        .update(user.id, task.id, task_input(acme.id, "Logo v2"))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Logo v2");

    h.services.payments.delete(user.id, payment.id).await.unwrap();
    let moved = h
        .services
        .tasks
        .update(user.id, task.id, task_input(globex.id, "Logo v2"))
        .await
        .unwrap();
    assert_eq!(moved.client_id, globex.id);
}

#[tokio::test]
async fn test_payment_amount_must_be_positive() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;

    for amount in [0.0, -10.0, f64::NAN] {
        let result = h
            .services
            .payments
            .create(user.id, payment_input(client.id, None, amount))
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidAmount)));
    }
}

#[tokio::test]
async fn test_overdue_summary_and_refresh() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;

    let mut late = payment_input(client.id, None, 120.0);
    late.due_date = days_from_now(-3);
    let late = h.services.payments.create(user.id, late).await.unwrap();

    let current = h
        .services
        .payments
        .create(user.id, payment_input(client.id, None, 80.0))
        .await
        .unwrap();

    let overdue = h.services.payments.overdue(user.id).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, late.id);

    assert_eq!(h.services.payments.refresh_overdue(user.id).await.unwrap(), 1);
    assert_eq!(
        h.services.payments.get(user.id, late.id).await.unwrap().status,
        PaymentStatus::Overdue
    );
    assert_eq!(h.services.payments.refresh_overdue(user.id).await.unwrap(), 0);

    let paid_on = Utc::now() - Duration::days(1);
    let paid = h
        .services
        .payments
        .mark_as_paid(user.id, current.id, Some(paid_on))
        .await
        .unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert_eq!(paid.paid_date, Some(paid_on));

    let summary = h
        .services
        .payments
        .summary(user.id, Utc::now() - Duration::days(30), Utc::now())
        .await
        .unwrap();
    assert_eq!(summary.total_paid, 80.0);

    let bad_range = h
        .services
        .payments
        .summary(user.id, Utc::now(), Utc::now() - Duration::days(1))
        .await;
    assert!(matches!(bad_range, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn test_update_to_paid_stamps_paid_date() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;
    let payment = h
        .services
        .payments
        .create(user.id, payment_input(client.id, None, 50.0))
        .await
        .unwrap();

    let mut input = payment_input(client.id, None, 55.0);
    input.status = Some(PaymentStatus::Paid);
    let now = Utc::now();
    let updated = h
        .services
        .payments
        .update_at(user.id, payment.id, input, now)
        .await
        .unwrap();

    assert_eq!(updated.amount, 55.0);
    assert_eq!(updated.status, PaymentStatus::Paid);
    assert_eq!(updated.paid_date, Some(now));
}

#[tokio::test]
async fn test_quota_usage_reports_counts() {
    let h = Harness::new();
    let user = h.user("ada@example.com").await;
    let client = h.client(&user, "Acme").await;
    h.services
        .tasks
        .create(user.id, task_input(client.id, "One"))
        .await
        .unwrap();

    let usage = h.services.quota.usage(user.id).await.unwrap();
    assert_eq!(usage.plan, UserPlan::Free);
    assert_eq!(usage.clients.current, 1);
    assert_eq!(usage.clients.remaining(), Some(4));
    assert_eq!(usage.todo_tasks.current, 1);
    assert_eq!(usage.todo_tasks.limit, Some(10));
}
