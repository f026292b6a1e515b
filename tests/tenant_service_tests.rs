//! 租户上下文解析服务测试
//!
//! 使用内存版成员关系存储，不依赖数据库

use media_system::{
    auth::middleware::AuthContext, error::AppError, models::role::Role,
    services::TenantService,
};
use std::sync::Arc;
use uuid::Uuid;

mod common;
use common::InMemoryMembershipStore;

fn service_with_store() -> (TenantService, Arc<InMemoryMembershipStore>) {
    let store = Arc::new(InMemoryMembershipStore::new());
    (TenantService::new(store.clone()), store)
}

fn member_context(user_id: Uuid) -> AuthContext {
    AuthContext {
        user_id,
        role: Role::Member,
        is_superadmin: false,
    }
}

fn superadmin_context(user_id: Uuid) -> AuthContext {
    AuthContext {
        user_id,
        role: Role::SuperAdmin,
        is_superadmin: true,
    }
}

#[tokio::test]
async fn test_switch_requires_membership_then_sticks() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant_a = store.add_tenant("Tenant A");
    let tenant_b = store.add_tenant("Tenant B");
    store.add_membership(user, tenant_a, true);

    // 无成员关系的目标租户被拒绝
    let err = service.set_active_tenant(user, Role::Member, tenant_b).await.unwrap_err();
    assert!(matches!(err, AppError::NotTenantMember));

    // 活动成员关系的目标租户成功，且随后可读回
    service.set_active_tenant(user, Role::Member, tenant_a).await.unwrap();
    assert_eq!(service.get_active_tenant(user).await.unwrap(), Some(tenant_a));
}

#[tokio::test]
async fn test_validate_access_matrix() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant = store.add_tenant("Tenant");
    let other = store.add_tenant("Other");

    store.add_membership(user, tenant, true);

    assert!(service.validate_access(user, Role::Member, tenant).await.unwrap());
    assert!(!service.validate_access(user, Role::Member, other).await.unwrap());

    // 成员关系被停用后与不存在等价
    store.add_membership(user, tenant, false);
    assert!(!service.validate_access(user, Role::Member, tenant).await.unwrap());

    // SUPERADMIN 无需任何成员关系
    let superadmin = Uuid::new_v4();
    assert!(service.validate_access(superadmin, Role::SuperAdmin, tenant).await.unwrap());
    assert!(service.validate_access(superadmin, Role::SuperAdmin, other).await.unwrap());
}

#[tokio::test]
async fn test_superadmin_switch_bypasses_membership_but_needs_tenant() {
    let (service, store) = service_with_store();
    let superadmin = Uuid::new_v4();
    let tenant = store.add_tenant("Tenant");

    // 无成员关系也可切换
    service.set_active_tenant(superadmin, Role::SuperAdmin, tenant).await.unwrap();
    assert_eq!(service.get_active_tenant(superadmin).await.unwrap(), Some(tenant));

    // 目标租户必须存在
    let err = service
        .set_active_tenant(superadmin, Role::SuperAdmin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_tenants_only_active_memberships() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant_a = store.add_tenant("Alpha");
    let tenant_b = store.add_tenant("Beta");
    let tenant_c = store.add_tenant("Gamma");

    store.add_membership(user, tenant_a, true);
    store.add_membership(user, tenant_b, false);
    store.add_membership(user, tenant_c, true);

    let tenants = service.list_tenants(user).await.unwrap();
    let ids: Vec<Uuid> = tenants.iter().map(|t| t.id).collect();

    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&tenant_a));
    assert!(ids.contains(&tenant_c));
    assert!(!ids.contains(&tenant_b));
}

#[tokio::test]
async fn test_resolve_scope_explicit_beats_active() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant_a = store.add_tenant("A");
    let tenant_b = store.add_tenant("B");
    store.add_membership(user, tenant_a, true);
    store.add_membership(user, tenant_b, true);

    service.set_active_tenant(user, Role::Member, tenant_a).await.unwrap();

    let context = member_context(user);
    let resolved = service.resolve_scope(&context, Some(tenant_b)).await.unwrap();
    assert_eq!(resolved, tenant_b);

    let resolved = service.resolve_scope(&context, None).await.unwrap();
    assert_eq!(resolved, tenant_a);
}

#[tokio::test]
async fn test_resolve_scope_without_active_tenant_fails() {
    let (service, _store) = service_with_store();
    let context = member_context(Uuid::new_v4());

    let err = service.resolve_scope(&context, None).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveTenant));
}

#[tokio::test]
async fn test_resolve_scope_rechecks_membership_of_active_tenant() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant = store.add_tenant("Tenant");
    store.add_membership(user, tenant, true);

    service.set_active_tenant(user, Role::Member, tenant).await.unwrap();

    // 活动租户的成员关系事后被停用：解析必须失败
    store.add_membership(user, tenant, false);

    let context = member_context(user);
    let err = service.resolve_scope(&context, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotTenantMember));
}

#[tokio::test]
async fn test_resolve_scope_superadmin_explicit_per_call() {
    let (service, store) = service_with_store();
    let superadmin = Uuid::new_v4();
    let tenant = store.add_tenant("Tenant");

    // SUPERADMIN 没有固定归属租户，逐调用显式指定即可
    let context = superadmin_context(superadmin);
    let resolved = service.resolve_scope(&context, Some(tenant)).await.unwrap();
    assert_eq!(resolved, tenant);

    // 未显式指定且无活动租户时同样报 NoActiveTenant
    let err = service.resolve_scope(&context, None).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveTenant));
}

#[tokio::test]
async fn test_grant_then_deactivate_membership() {
    let (service, store) = service_with_store();
    let user = Uuid::new_v4();
    let tenant = store.add_tenant("Tenant");

    service.grant_membership(user, tenant).await.unwrap();
    assert!(service.validate_access(user, Role::Member, tenant).await.unwrap());

    service.deactivate_membership(user, tenant).await.unwrap();
    assert!(!service.validate_access(user, Role::Member, tenant).await.unwrap());

    // 已停用的成员关系再次停用等同不存在
    let err = service.deactivate_membership(user, tenant).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // 重新授予即重新激活
    service.grant_membership(user, tenant).await.unwrap();
    assert!(service.validate_access(user, Role::Member, tenant).await.unwrap());
}
