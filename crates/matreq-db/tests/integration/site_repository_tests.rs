use matreq_core::AppError;
use matreq_core::request::{Department, NewMaterialRequest, RequestStatus};
use matreq_core::site::{NewSite, PurchaserAssignment, SitePatch, SiteStatus, SupervisorAssignment};
use matreq_core::user::Role;
use matreq_db::{RequestRepository, SiteRepository};

use crate::common::{seed_user, setup_test_db};

fn new_site(name: &str) -> NewSite {
    NewSite {
        name: name.to_string(),
        address: "1 Test Street".to_string(),
        client_name: None,
        city: Some("Karachi".to_string()),
        province: None,
        plot_size: None,
        status: SiteStatus::Active,
        updated_by: None,
    }
}

#[tokio::test]
async fn create_site_with_crew_and_read_back() {
    let (pool, _container) = setup_test_db().await;
    let repo = SiteRepository::new(pool.clone());

    let supervisor = seed_user(&pool, "sup@example.com", Role::Supervisor).await;
    let purchaser = seed_user(&pool, "pur@example.com", Role::Purchaser).await;

    let created = repo
        .create(
            &new_site("Crewed Site"),
            &[SupervisorAssignment {
                user_id: supervisor.id,
                status: Some("active".into()),
            }],
            &[PurchaserAssignment {
                user_id: purchaser.id,
                status: Some("active".into()),
                material_type: Some("steel".into()),
            }],
        )
        .await
        .unwrap();

    assert_eq!(created.site.name, "Crewed Site");
    assert_eq!(created.supervisors.len(), 1);
    assert_eq!(created.supervisors[0].user.email, "sup@example.com");
    assert_eq!(created.purchasers.len(), 1);
    assert_eq!(created.purchasers[0].material_type.as_deref(), Some("steel"));
}

#[tokio::test]
async fn crew_assignment_to_unknown_user_fails_validation() {
    let (pool, _container) = setup_test_db().await;
    let repo = SiteRepository::new(pool);

    let err = repo
        .create(
            &new_site("Ghost Crew"),
            &[SupervisorAssignment {
                user_id: uuid::Uuid::new_v4(),
                status: None,
            }],
            &[],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn update_replaces_crew_wholesale() {
    let (pool, _container) = setup_test_db().await;
    let repo = SiteRepository::new(pool.clone());

    let first = seed_user(&pool, "first@example.com", Role::Supervisor).await;
    let second = seed_user(&pool, "second@example.com", Role::Supervisor).await;

    let created = repo
        .create(
            &new_site("Rotating Crew"),
            &[SupervisorAssignment {
                user_id: first.id,
                status: None,
            }],
            &[],
        )
        .await
        .unwrap();

    let updated = repo
        .update(
            created.site.id,
            &SitePatch::default(),
            Some(&[SupervisorAssignment {
                user_id: second.id,
                status: Some("active".into()),
            }]),
            None,
        )
        .await
        .unwrap()
        .expect("site should exist");

    assert_eq!(updated.supervisors.len(), 1);
    assert_eq!(updated.supervisors[0].user.id, second.id);
}

#[tokio::test]
async fn delete_refuses_while_requests_reference_the_site() {
    let (pool, _container) = setup_test_db().await;
    let sites = SiteRepository::new(pool.clone());
    let requests = RequestRepository::new(pool.clone());

    let site = sites.create(&new_site("Busy Site"), &[], &[]).await.unwrap();
    requests
        .create(
            &NewMaterialRequest {
                site_id: site.site.id,
                material_name: "Gravel".into(),
                unit: "ton".into(),
                released_qty: 3.5,
                comments: None,
                status: RequestStatus::Pending,
                current_department: Department::Supervisor,
            },
            &[],
            &[],
        )
        .await
        .unwrap();

    let err = sites.delete(site.site.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(sites.get(site.site.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_removes_site_and_assignment_rows() {
    let (pool, _container) = setup_test_db().await;
    let repo = SiteRepository::new(pool.clone());

    let supervisor = seed_user(&pool, "cleanup@example.com", Role::Supervisor).await;
    let site = repo
        .create(
            &new_site("Short-lived"),
            &[SupervisorAssignment {
                user_id: supervisor.id,
                status: None,
            }],
            &[],
        )
        .await
        .unwrap();

    assert!(repo.delete(site.site.id).await.unwrap());
    assert!(repo.get(site.site.id).await.unwrap().is_none());

    let (assignments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM site_supervisors")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(assignments, 0);
}
