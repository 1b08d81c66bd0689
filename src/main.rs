// ==========================================
// 冷冻食品生产批次流程系统 - 主入口
// ==========================================
// 用法:
//   frozen-production                 打印工位链路与生产参数
//   frozen-production import <file>   导入产品/BOM (CSV / Excel)
// 环境变量:
//   FROZEN_PRODUCTION_DB_PATH   数据库路径
//   FROZEN_PRODUCTION_LOG_JSON  =1 时输出 JSON 日志
// ==========================================

use frozen_production::app::{get_default_db_path, AppState};
use frozen_production::logging;

fn main() -> anyhow::Result<()> {
    if std::env::var("FROZEN_PRODUCTION_LOG_JSON").as_deref() == Ok("1") {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", frozen_production::APP_NAME);
    tracing::info!("系统版本: {}", frozen_production::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => {
            let file = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("用法: frozen-production import <file>"))?;
            let summary = state
                .catalog_api
                .import_catalog_file(file, "cli")
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!(
                "导入完成: {} 行, 产品 {} 个, BOM {} 行, 耗时 {}ms",
                summary.rows_read,
                summary.products_upserted,
                summary.bom_entries_upserted,
                summary.elapsed_ms
            );
        }
        Some(other) => anyhow::bail!("未知命令: {}", other),
        None => print_overview(&state)?,
    }

    Ok(())
}

fn print_overview(state: &AppState) -> anyhow::Result<()> {
    println!("工位链路:");
    for info in state.workstation_api.list_station_info() {
        let next = info
            .successor
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>2}. {:<14} {:<18} → {}",
            info.station.position() + 1,
            info.code,
            info.display_name,
            next
        );
    }

    let config = state.config_api.get_production_config()?;
    let validation = state
        .config_api
        .validate_production_config(config.base_order_quantity, config.fixed_batch_count)?;
    println!(
        "生产参数: base_order_quantity={}, fixed_batch_count={}",
        config.base_order_quantity, config.fixed_batch_count
    );
    if let Some(warning) = validation.warning() {
        println!("  警告: {}", warning);
    }
    Ok(())
}
