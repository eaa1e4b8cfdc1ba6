use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on how many QR labels are actually deployed.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static QR_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(
        FILTER_CAPACITY,
        FALSE_POSITIVE_RATE,
    ))
});

#[inline]
fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Check if a scanned code might be a known QR label (false positives
/// possible). A definite miss lets scan submissions be rejected without a
/// database round trip.
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    QR_FILTER
        .read()
        .expect("qr filter poisoned")
        .contains(&code)
}

/// Register a newly printed QR code in the filter
pub fn insert(code: &str) {
    let code = normalize(code);
    QR_FILTER
        .write()
        .expect("qr filter poisoned")
        .add(&code);
}

/// Remove a retired QR code from the filter
pub fn remove(code: &str) {
    let code = normalize(code);
    QR_FILTER
        .write()
        .expect("qr filter poisoned")
        .remove(&code);
}

/// Warm up the QR filter using streaming + batching
pub async fn warmup_qr_filter(
    pool: &MySqlPool,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT qr_code FROM areas WHERE qr_code IS NOT NULL",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("QR filter warmup complete: {} codes", total);
    Ok(())
}

/// Insert a batch of normalized codes
fn insert_batch(codes: &[String]) {
    let mut filter = QR_FILTER
        .write()
        .expect("qr filter poisoned");

    for code in codes {
        filter.add(code);
    }
}
