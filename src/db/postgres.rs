//! PostgreSQL 存储实现
//!
//! 连接池在构造时显式创建并注入；池获取失败时对当前块静默
//! 回退为一次直连，块本身不因此失败。每个块一个事务，成功
//! 提交、失败回滚，连接在任何退出路径上都会被归还或关闭。

use crate::config::DatabaseConfig;
use crate::db::{ChunkStorage, InsertMode, TableAdmin};
use crate::error::{EtlError, Result};
use crate::paper::{PaperRow, ROW_COLUMNS};
use async_trait::async_trait;
use bytes::Bytes;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use futures::{SinkExt, pin_mut};
use tokio_postgres::{CopyInSink, NoTls, Transaction, types::ToSql};

/// COPY 每次向 sink 发送的行数，控制单次内存占用
const COPY_WRITE_BATCH: usize = 1000;

/// 多行 INSERT 每条语句的行数上限（5 列 × 1000 行，
/// 远低于 PostgreSQL 的 65535 参数上限）
const INSERT_BATCH_ROWS: usize = 1000;

/// PostgreSQL 块存储
pub struct PgStorage {
    conninfo: String,
    pool: Option<Pool>,
}

impl PgStorage {
    /// 根据配置构造存储，按需创建连接池
    ///
    /// 连接是惰性建立的：这里只构造池对象和连接串，首个块
    /// 写入时才真正联库。
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conninfo = config.conninfo();

        let pool = if config.use_pool {
            let mut pg_config = tokio_postgres::Config::new();
            pg_config
                .host(&config.host)
                .port(config.port)
                .user(&config.username)
                .password(&config.password)
                .dbname(&config.database);

            let manager = Manager::from_config(
                pg_config,
                NoTls,
                ManagerConfig { recycling_method: RecyclingMethod::Fast },
            );
            let pool = Pool::builder(manager)
                .max_size(config.pool_max_size)
                .build()
                .map_err(|e| EtlError::pool(e.to_string()))?;

            tracing::debug!(
                "连接池已创建: max_size={}",
                config.pool_max_size
            );
            Some(pool)
        } else {
            None
        };

        Ok(Self { conninfo, pool })
    }

    /// 建立一条直连，并在后台驱动其连接任务
    async fn connect_direct(&self) -> Result<tokio_postgres::Client> {
        let (client, connection) =
            tokio_postgres::connect(&self.conninfo, NoTls)
                .await
                .map_err(|e| EtlError::connection(e.to_string()))?;

        // 连接驱动任务随 client 的释放自然结束
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL 连接任务出错: {}", e);
            }
        });

        Ok(client)
    }

    /// 在给定连接上执行一个块事务
    async fn insert_with_client(
        &self,
        client: &mut tokio_postgres::Client,
        table: &str,
        rows: &[PaperRow],
        mode: InsertMode,
    ) -> Result<u64> {
        let tx = client
            .transaction()
            .await
            .map_err(|e| EtlError::from_db(e, table))?;

        let result = match mode {
            InsertMode::BulkCopy => copy_rows(&tx, table, rows).await,
            InsertMode::BatchedInsert => {
                batched_insert(&tx, table, rows).await
            }
        };

        match result {
            Ok(inserted) => {
                tx.commit()
                    .await
                    .map_err(|e| EtlError::from_db(e, table))?;
                Ok(inserted)
            }
            Err(e) => {
                // 显式回滚；即使回滚本身失败，事务也会随连接释放而中止
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("回滚失败: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl TableAdmin for PgStorage {
    async fn ensure_table(&self, table: &str) -> Result<()> {
        let client = self.connect_direct().await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                paper_id VARCHAR(100) PRIMARY KEY,
                title TEXT,
                section TEXT,
                content TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        );
        client
            .batch_execute(&ddl)
            .await
            .map_err(|e| EtlError::from_db(e, table))?;
        tracing::info!("表 {} 就绪", table);
        Ok(())
    }

    async fn truncate_table(&self, table: &str) -> Result<()> {
        let client = self.connect_direct().await?;
        client
            .batch_execute(&format!("TRUNCATE TABLE {table}"))
            .await
            .map_err(|e| EtlError::from_db(e, table))?;
        tracing::info!("表 {} 已清空", table);
        Ok(())
    }
}

#[async_trait]
impl ChunkStorage for PgStorage {
    async fn insert_rows(
        &self,
        table: &str,
        rows: &[PaperRow],
        mode: InsertMode,
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        // 优先使用池化连接；池获取失败或池化连接中断时，
        // 对当前块回退为一次直连。连接中断时事务已中止，
        // 整块重试不会产生部分写入。
        if let Some(pool) = &self.pool {
            match pool.get().await {
                Ok(mut client) => {
                    match self
                        .insert_with_client(&mut client, table, rows, mode)
                        .await
                    {
                        Err(e) if e.is_connection_error() => {
                            tracing::warn!(
                                "池化连接中断，重试一次直连: {}",
                                e
                            );
                        }
                        other => return other,
                    }
                }
                Err(e) => {
                    tracing::warn!("获取池化连接失败，回退为直连: {}", e);
                }
            }
        }

        let mut client = self.connect_direct().await?;
        self.insert_with_client(&mut client, table, rows, mode).await
    }
}

/// COPY 文本格式的值转义
///
/// NULL → `\N`，反斜杠、制表符、换行需转义
fn escape_copy_value(value: Option<&str>) -> String {
    match value {
        None => "\\N".to_string(),
        Some(s) => s
            .replace('\\', "\\\\")
            .replace('\t', "\\t")
            .replace('\n', "\\n")
            .replace('\r', "\\r"),
    }
}

/// 通过 COPY 协议流式写入一个块
async fn copy_rows(
    tx: &Transaction<'_>,
    table: &str,
    rows: &[PaperRow],
) -> Result<u64> {
    let copy_sql = format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text)",
        table,
        ROW_COLUMNS.join(", ")
    );
    let sink: CopyInSink<Bytes> = tx
        .copy_in(copy_sql.as_str())
        .await
        .map_err(|e| EtlError::from_db(e, table))?;
    pin_mut!(sink);

    for batch in rows.chunks(COPY_WRITE_BATCH) {
        let mut data = String::with_capacity(batch.len() * 256);
        for row in batch {
            data.push_str(&escape_copy_value(Some(&row.paper_id)));
            data.push('\t');
            data.push_str(&escape_copy_value(row.title.as_deref()));
            data.push('\t');
            data.push_str(&escape_copy_value(row.section.as_deref()));
            data.push('\t');
            data.push_str(&escape_copy_value(row.content.as_deref()));
            data.push('\t');
            data.push_str(
                &row.created_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            );
            data.push('\n');
        }
        sink.send(Bytes::from(data))
            .await
            .map_err(|e| EtlError::from_db(e, table))?;
    }

    sink.finish().await.map_err(|e| EtlError::from_db(e, table))
}

/// 多行参数化 INSERT 写入一个块，重复主键静默跳过
///
/// 返回值是实际插入的行数，被 ON CONFLICT 跳过的行不计入。
async fn batched_insert(
    tx: &Transaction<'_>,
    table: &str,
    rows: &[PaperRow],
) -> Result<u64> {
    let mut inserted = 0u64;

    for batch in rows.chunks(INSERT_BATCH_ROWS) {
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            table,
            ROW_COLUMNS.join(", ")
        );
        let mut params: Vec<&(dyn ToSql + Sync)> =
            Vec::with_capacity(batch.len() * ROW_COLUMNS.len());

        for (i, row) in batch.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let base = i * ROW_COLUMNS.len();
            sql.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${})",
                base + 1,
                base + 2,
                base + 3,
                base + 4,
                base + 5
            ));
            params.push(&row.paper_id);
            params.push(&row.title);
            params.push(&row.section);
            params.push(&row.content);
            params.push(&row.created_at);
        }
        sql.push_str(" ON CONFLICT (paper_id) DO NOTHING");

        inserted += tx
            .execute(sql.as_str(), &params)
            .await
            .map_err(|e| EtlError::from_db(e, table))?;
    }

    Ok(inserted)
}
