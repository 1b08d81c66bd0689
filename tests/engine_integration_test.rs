// ==========================================
// 引擎层集成测试
// ==========================================
// 测试范围:
// 1. 批次拆分不变量 (件数守恒 / 重量守恒)
// 2. 工位链路: 从首站出发恰好 6 步到达末站
// 3. 订单状态机: 终态不可离开
// ==========================================

use frozen_production::domain::station::Station;
use frozen_production::domain::types::OrderState;
use frozen_production::engine::{build_batches, compute_batch_plan, OrderLifecycleEngine, StationCatalog};

#[test]
fn test_batch_plan_件数守恒() {
    for quantity in [1_i64, 7, 10, 99, 500, 503, 1001] {
        for batch_count in [1_i64, 3, 10, 13, 100] {
            let plan = compute_batch_plan(quantity, 250.0, batch_count).unwrap();
            assert_eq!(
                plan.units_per_batch * batch_count + plan.remainder_units,
                quantity,
                "quantity={} batch_count={}",
                quantity,
                batch_count
            );
            assert!(plan.remainder_units < batch_count);
        }
    }
}

#[test]
fn test_batch_plan_重量守恒() {
    let plan = compute_batch_plan(503, 500.0, 10).unwrap();
    let batches = build_batches("order-1", &plan);
    let total: f64 = batches.iter().map(|b| b.weight_kg).sum();
    assert!((total - plan.total_weight_kg).abs() < 1e-6);
    let units: f64 = batches.iter().map(|b| b.units_in_batch).sum();
    assert!((units - 503.0).abs() < 1e-9);
}

#[test]
fn test_station_chain_无环且终止() {
    let chain: Vec<Station> = StationCatalog::chain().collect();
    assert_eq!(chain.len(), 6);
    assert_eq!(chain.first(), Some(&Station::Lavado));
    assert_eq!(chain.last(), Some(&Station::Empaquetado));
    assert_eq!(StationCatalog::successor_of(Station::Empaquetado), None);
    assert_eq!(
        StationCatalog::successor_of_code("PELADO_TROZADO").unwrap(),
        Some(Station::Escurrido)
    );
}

#[test]
fn test_order_state_终态不可离开() {
    let engine = OrderLifecycleEngine::new();
    let all = [
        OrderState::Planned,
        OrderState::Active,
        OrderState::Paused,
        OrderState::Consumed,
        OrderState::Cancelled,
    ];
    for terminal in [OrderState::Consumed, OrderState::Cancelled] {
        for target in all {
            assert!(!engine.can_transition(terminal, target));
        }
    }
}
