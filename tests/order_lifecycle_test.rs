// ==========================================
// 订单生命周期集成测试
// ==========================================
// 测试范围:
// 1. 创建: 数量/SKU 校验
// 2. 激活: 批次拆分、原料预留、库存不足回滚
// 3. 暂停/恢复/取消: 状态机与预留释放
// 4. 超时: 重新查询确认结果
// ==========================================

mod helpers;

use frozen_production::api::ApiError;
use frozen_production::domain::station::Station;
use frozen_production::domain::types::{BatchState, OrderState};
use frozen_production::engine::BatchAdvisory;
use helpers::api_test_helper::*;
use helpers::mock_gateway::{BeforeCancelHook, InterleavedGateway, TimeoutGateway, TimeoutMode};

// ==========================================
// 创建订单
// ==========================================

#[test]
fn test_create_order_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();

    let order = env
        .production_api
        .create_order(sku, 500, "supervisor", Some("turno mañana"))
        .expect("创建订单失败");

    assert_eq!(order.state, OrderState::Planned);
    assert_eq!(order.quantity_units, 500);
    assert_eq!(order.notes.as_deref(), Some("turno mañana"));
    assert!(order.batch_count.is_none());

    let history = env.production_api.get_order_history(&order.order_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action_type, "CREATE_ORDER");
}

#[test]
fn test_create_order_非法输入() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();

    assert!(matches!(
        env.production_api.create_order(sku, 0, "supervisor", None),
        Err(ApiError::InvalidOrder(_))
    ));
    assert!(matches!(
        env.production_api.create_order("PT-NO-EXISTE", 10, "supervisor", None),
        Err(ApiError::InvalidOrder(_))
    ));
    // 原料不能下生产订单
    assert!(matches!(
        env.production_api.create_order("MP-BROCOLI", 10, "supervisor", None),
        Err(ApiError::InvalidOrder(_))
    ));
    assert!(matches!(
        env.production_api.create_order(sku, 10, "  ", None),
        Err(ApiError::ValidationError(_))
    ));
}

#[tokio::test]
async fn test_suggested_quantity_来自生产参数() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    assert_eq!(env.production_api.suggested_quantity().await.unwrap(), 500);

    env.config_api.set_production_config(480, 12, "admin").unwrap();
    assert_eq!(env.production_api.suggested_quantity().await.unwrap(), 480);
}

// ==========================================
// 预览与激活
// ==========================================

#[tokio::test]
async fn test_preview_与激活结果一致() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();

    let preview = env.production_api.preview_batch_plan(sku, 500).await.unwrap();
    let (order, batches) = env.create_active_order(sku, 500).await;

    assert_eq!(order.batch_count, Some(preview.plan.batch_count));
    assert_eq!(order.total_weight_kg, Some(preview.plan.total_weight_kg));
    assert_eq!(batches.len() as i64, preview.plan.batch_count);
}

#[tokio::test]
async fn test_activate_order_500件_10批() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();

    let order = env.production_api.create_order(sku, 500, "supervisor", None).unwrap();
    let result = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .expect("激活失败");

    assert!(!result.recovered);
    assert_eq!(result.order.state, OrderState::Active);
    assert_eq!(result.order.batch_count, Some(10));
    assert_eq!(result.order.unit_weight_grams, Some(500.0));
    assert_eq!(result.order.total_weight_kg, Some(250.0));
    assert!(result.order.activated_at.is_some());

    let plan = result.preview.plan;
    assert_eq!(plan.total_weight_kg, 250.0);
    assert_eq!(plan.weight_per_batch_kg, 25.0);
    assert_eq!(plan.units_per_batch, 50);
    assert_eq!(plan.remainder_units, 0);
    assert!(result.preview.config_warning.is_none());
    assert!(result.preview.advisories.is_empty());

    assert_eq!(result.batches.len(), 10);
    for (idx, batch) in result.batches.iter().enumerate() {
        assert_eq!(batch.sequence_no, idx as i64 + 1);
        assert_eq!(batch.weight_kg, 25.0);
        assert_eq!(batch.units_in_batch, 50.0);
        assert_eq!(batch.current_station, Station::Lavado);
        assert_eq!(batch.state, BatchState::Pending);
    }

    // 预留: 480 g × 500 件, 20 g × 500 件
    assert_eq!(env.reservation_repo.get_stock("MP-BROCOLI").unwrap(), 760_000.0);
    assert_eq!(env.reservation_repo.get_stock("MP-BOLSA").unwrap(), 990_000.0);
    let detail = env.production_api.get_order_detail(&order.order_id).unwrap();
    assert_eq!(detail.reservations.len(), 2);
    assert_eq!(detail.progress.pending, 10);
}

#[tokio::test]
async fn test_activate_order_503件_余数警告不阻断() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();

    let order = env.production_api.create_order(sku, 503, "supervisor", None).unwrap();
    let result = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .expect("余数件不应阻断激活");

    assert_eq!(result.order.state, OrderState::Active);
    assert_eq!(result.preview.plan.units_per_batch, 50);
    assert_eq!(result.preview.plan.remainder_units, 3);
    assert_eq!(
        result.preview.config_warning.as_deref(),
        Some("remainder units: 3")
    );
    assert!(result
        .preview
        .advisories
        .contains(&BatchAdvisory::RemainderUnits { remainder_units: 3 }));
    assert_eq!(result.batches.len(), 10);
}

#[tokio::test]
async fn test_activate_order_库存不足_订单保持PLANNED() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_product("PT-ARVEJA-1K", &[("MP-ARVEJA", 1000.0)], 100.0);

    let order = env
        .production_api
        .create_order("PT-ARVEJA-1K", 10, "supervisor", None)
        .unwrap();
    let err = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ActivationError(_)), "实际错误: {:?}", err);

    let detail = env.production_api.get_order_detail(&order.order_id).unwrap();
    assert_eq!(detail.order.state, OrderState::Planned);
    assert!(detail.batches.is_empty());
    assert!(detail.reservations.is_empty());
    assert_eq!(env.reservation_repo.get_stock("MP-ARVEJA").unwrap(), 100.0);

    // 补足库存后可重试
    env.reservation_repo.set_stock("MP-ARVEJA", 10_000.0).unwrap();
    let result = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .expect("重试激活失败");
    assert_eq!(result.order.state, OrderState::Active);
}

#[tokio::test]
async fn test_activate_order_重复激活被拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, _) = env.create_active_order(sku, 100).await;

    let err = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ActivationError(_)));
    assert_eq!(env.batch_repo.list_by_order(&order.order_id).unwrap().len(), 10);
}

#[tokio::test]
async fn test_activate_order_空BOM使用默认单件重量() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.catalog_repo
        .upsert_product(&finished_product("PT-SIN-BOM"))
        .unwrap();

    let (order, batches) = env.create_active_order("PT-SIN-BOM", 20).await;
    assert_eq!(order.unit_weight_grams, Some(500.0));
    assert_eq!(order.total_weight_kg, Some(10.0));
    assert_eq!(batches.len(), 10);
    assert_eq!(batches[0].weight_kg, 1.0);
}

// ==========================================
// 暂停 / 恢复
// ==========================================

#[tokio::test]
async fn test_pause_resume_order() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, batches) = env.create_active_order(sku, 100).await;

    let paused = env
        .production_api
        .pause_order(&order.order_id, "supervisor", "falta de personal")
        .unwrap();
    assert_eq!(paused.state, OrderState::Paused);

    // 暂停期间批次不出现在工位列表, 也不能推进
    assert!(env.workstation_api.list_batches_by_station("LAVADO").unwrap().is_empty());
    assert!(matches!(
        env.workstation_api.start_batch(&batches[0].batch_id, "operario"),
        Err(ApiError::InvalidStateTransition { .. })
    ));
    // 暂停订单不能直接取消
    assert!(matches!(
        env.production_api
            .cancel_order(&order.order_id, "supervisor", "cambio de plan")
            .await,
        Err(ApiError::InvalidStateTransition { .. })
    ));
    // 重复暂停非法
    assert!(env
        .production_api
        .pause_order(&order.order_id, "supervisor", "otra vez")
        .is_err());

    let resumed = env
        .production_api
        .resume_order(&order.order_id, "supervisor", "personal disponible")
        .unwrap();
    assert_eq!(resumed.state, OrderState::Active);
    assert_eq!(env.workstation_api.list_batches_by_station("LAVADO").unwrap().len(), 10);
}

#[test]
fn test_resume_planned_order_非法() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 100, "supervisor", None).unwrap();

    assert!(matches!(
        env.production_api.resume_order(&order.order_id, "supervisor", "x"),
        Err(ApiError::InvalidStateTransition { .. })
    ));
}

// ==========================================
// 取消
// ==========================================

#[tokio::test]
async fn test_cancel_active_order_释放未完工批次的预留() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, batches) = env.create_active_order(sku, 500).await;

    // 完成第一个批次
    env.run_batch_to_completion(&batches[0].batch_id);

    let result = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "pedido anulado")
        .await
        .expect("取消失败");
    assert!(!result.already_cancelled);
    assert_eq!(result.cancelled_batches, 9);
    assert_eq!(result.order.state, OrderState::Cancelled);

    let after = env.batch_repo.list_by_order(&order.order_id).unwrap();
    assert_eq!(after[0].state, BatchState::Completed);
    assert!(after[1..].iter().all(|b| b.state == BatchState::Cancelled));

    // 9/10 的预留返还库存
    let brocoli = env.reservation_repo.get_stock("MP-BROCOLI").unwrap();
    assert!((brocoli - 976_000.0).abs() < 1e-6, "实际库存: {}", brocoli);
    let reservations = env.reservation_repo.find_by_order(&order.order_id).unwrap();
    assert!(reservations.iter().all(|r| r.released));
}

#[tokio::test]
async fn test_cancel_order_幂等() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, _) = env.create_active_order(sku, 500).await;

    env.production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .unwrap();
    let stock_after_first = env.reservation_repo.get_stock("MP-BROCOLI").unwrap();

    let again = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .expect("重复取消应成功");
    assert!(again.already_cancelled);
    assert_eq!(again.cancelled_batches, 0);
    assert_eq!(env.reservation_repo.get_stock("MP-BROCOLI").unwrap(), stock_after_first);
    assert_eq!(stock_after_first, 1_000_000.0);
}

#[tokio::test]
async fn test_cancel_planned_order() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 100, "supervisor", None).unwrap();

    let result = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "no se produce")
        .await
        .unwrap();
    assert_eq!(result.order.state, OrderState::Cancelled);
    assert_eq!(result.cancelled_batches, 0);

    // 已取消订单不能激活
    assert!(env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .is_err());
}

#[tokio::test]
async fn test_cancel_order_预检后被激活_新批次一并取消() {
    let hook = BeforeCancelHook::default();
    let env = ApiTestEnv::with_gateway({
        let hook = hook.clone();
        move |inner| InterleavedGateway::wrap(inner, hook)
    })
    .expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 100, "supervisor", None).unwrap();

    // 取消预检看到 PLANNED, 提交前订单被激活
    let api = env.production_api.clone();
    let order_id = order.order_id.clone();
    hook.set(move || async move {
        api.activate_order(&order_id, "supervisor").await.unwrap();
    });

    let result = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .expect("取消失败");
    assert_eq!(result.order.state, OrderState::Cancelled);
    assert_eq!(result.cancelled_batches, 10);

    let batches = env.batch_repo.list_by_order(&order.order_id).unwrap();
    assert_eq!(batches.len(), 10);
    assert!(batches.iter().all(|b| b.state == BatchState::Cancelled));
    assert_eq!(env.reservation_repo.get_stock("MP-BROCOLI").unwrap(), 1_000_000.0);
}

#[tokio::test]
async fn test_cancel_order_预检后被暂停_拒绝取消() {
    let hook = BeforeCancelHook::default();
    let env = ApiTestEnv::with_gateway({
        let hook = hook.clone();
        move |inner| InterleavedGateway::wrap(inner, hook)
    })
    .expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, _) = env.create_active_order(sku, 100).await;

    let api = env.production_api.clone();
    let order_id = order.order_id.clone();
    hook.set(move || async move {
        api.pause_order(&order_id, "supervisor", "limpieza").unwrap();
    });

    let err = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }), "实际 {:?}", err);

    assert_eq!(
        env.order_repo.get(&order.order_id).unwrap().state,
        OrderState::Paused
    );
    let batches = env.batch_repo.list_by_order(&order.order_id).unwrap();
    assert!(batches.iter().all(|b| b.state == BatchState::Pending));
    assert_eq!(env.reservation_repo.get_stock("MP-BROCOLI").unwrap(), 952_000.0);
}

// ==========================================
// 超时后的结果确认
// ==========================================

#[tokio::test]
async fn test_activation_timeout_已提交_重新查询后成功() {
    let env = ApiTestEnv::with_gateway(|inner| TimeoutGateway::wrap(inner, TimeoutMode::AfterCommit))
        .expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 500, "supervisor", None).unwrap();

    let result = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .expect("提交已生效, 应确认为成功");
    assert!(result.recovered);
    assert_eq!(result.order.state, OrderState::Active);
    assert_eq!(result.batches.len(), 10);
}

#[tokio::test]
async fn test_activation_timeout_未提交_结果未知() {
    let env = ApiTestEnv::with_gateway(|inner| TimeoutGateway::wrap(inner, TimeoutMode::BeforeCommit))
        .expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 500, "supervisor", None).unwrap();

    let err = env
        .production_api
        .activate_order(&order.order_id, "supervisor")
        .await
        .unwrap_err();
    match err {
        ApiError::AmbiguousOutcome {
            order_id,
            observed_state,
        } => {
            assert_eq!(order_id, order.order_id);
            assert_eq!(observed_state, "PLANNED");
        }
        other => panic!("期望 AmbiguousOutcome, 实际 {:?}", other),
    }
    assert_eq!(
        env.order_repo.get(&order.order_id).unwrap().state,
        OrderState::Planned
    );
    assert!(env.batch_repo.list_by_order(&order.order_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_cancellation_timeout_已提交_视为成功() {
    let env = ApiTestEnv::with_gateway(|inner| TimeoutGateway::wrap(inner, TimeoutMode::AfterCommit))
        .expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let order = env.production_api.create_order(sku, 100, "supervisor", None).unwrap();

    let result = env
        .production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .expect("取消已生效");
    assert_eq!(result.order.state, OrderState::Cancelled);
}

// ==========================================
// 查询
// ==========================================

#[tokio::test]
async fn test_list_orders_按状态过滤() {
    use frozen_production::domain::order::OrderFilter;

    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    env.production_api.create_order(sku, 100, "supervisor", None).unwrap();
    env.create_active_order(sku, 200).await;

    let all = env.production_api.list_orders(&OrderFilter::default()).unwrap();
    assert_eq!(all.len(), 2);

    let active = env
        .production_api
        .list_orders(&OrderFilter {
            state: Some(OrderState::Active),
            sku: None,
        })
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].quantity_units, 200);
}

#[tokio::test]
async fn test_recent_activity_新的在前() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let sku = env.seed_standard_product();
    let (order, _) = env.create_active_order(sku, 100).await;
    env.config_api.set_production_config(500, 5, "admin").unwrap();
    env.production_api
        .cancel_order(&order.order_id, "supervisor", "anulado")
        .await
        .unwrap();

    let recent = env.production_api.recent_activity(2).unwrap();
    let types: Vec<&str> = recent.iter().map(|log| log.action_type.as_str()).collect();
    assert_eq!(types, vec!["CANCEL_ORDER", "UPDATE_CONFIG"]);
    assert_eq!(recent[0].payload_json.as_ref().unwrap()["cancelled_batches"], 10);

    assert_eq!(env.production_api.recent_activity(50).unwrap().len(), 4);
    assert!(matches!(
        env.production_api.recent_activity(0),
        Err(ApiError::InvalidInput(_))
    ));
}
