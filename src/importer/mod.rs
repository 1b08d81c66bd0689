// ==========================================
// 冷冻食品生产批次流程系统 - 导入层
// ==========================================
// 职责: 外部产品目录/BOM 文件导入
// 支持: Excel, CSV
// ==========================================

pub mod catalog_importer;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use catalog_importer::{parse_records, CatalogImportSummary, CatalogImporter, ParsedCatalog};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
