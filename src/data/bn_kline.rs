use {
    anyhow::{Result, anyhow, bail},
    binance_sdk::{
        config::ConfigurationRestApi,
        errors::{self, ConnectorError as connection_error},
        spot::{
            SpotRestApi,
            rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
        },
    },
    std::{collections::HashSet, convert::TryFrom, error::Error, fmt},
};

use crate::{
    config::{BINANCE, BinanceApiConfig, DF},
    data::GlobalRateLimiter,
    domain::{Candle, PairInterval},
    utils::{TimeUtils, epoch_ms_to_datetime_string},
};

pub fn try_interval_from_ms(ms: i64) -> Result<KlinesIntervalEnum, String> {
    use TimeUtils as T;
    match ms {
        T::MS_IN_MIN => Ok(KlinesIntervalEnum::Interval1m),
        T::MS_IN_5_MIN => Ok(KlinesIntervalEnum::Interval5m),
        T::MS_IN_15_MIN => Ok(KlinesIntervalEnum::Interval15m),
        T::MS_IN_30_MIN => Ok(KlinesIntervalEnum::Interval30m),
        T::MS_IN_H => Ok(KlinesIntervalEnum::Interval1h),
        T::MS_IN_4_H => Ok(KlinesIntervalEnum::Interval4h),
        T::MS_IN_D => Ok(KlinesIntervalEnum::Interval1d),
        T::MS_IN_W => Ok(KlinesIntervalEnum::Interval1w),
        T::MS_IN_1_M => Ok(KlinesIntervalEnum::Interval1M),
        _ => Err(format!("Unsupported interval: {}ms", ms)),
    }
}

#[derive(Debug, PartialOrd, PartialEq)]
pub struct BNKline {
    pub open_timestamp_ms: i64,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: Option<f64>,
    pub base_asset_volume: Option<f64>,
    pub quote_asset_volume: Option<f64>,
}

#[derive(Debug)]
pub enum BNKlineError {
    InvalidLength,
    InvalidType(String),
    ConnectionFailed(String),
}

impl fmt::Display for BNKlineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            BNKlineError::InvalidLength => write!(f, "Invalid length"),
            BNKlineError::InvalidType(string) => write!(f, "Invalid type: {}", string),
            BNKlineError::ConnectionFailed(msg) => {
                write!(f, "Binance API connection failed: {}.", msg)
            }
        }
    }
}

impl Error for BNKlineError {}

fn kline_item_to_float(item: Option<KlinesItemInner>) -> Option<f64> {
    item.and_then(|inner| {
        if let KlinesItemInner::String(s) = inner {
            s.parse::<f64>().ok()
        } else {
            None
        }
    })
}

impl TryFrom<Vec<KlinesItemInner>> for BNKline {
    type Error = BNKlineError;

    fn try_from(vec_inner_klines: Vec<KlinesItemInner>) -> Result<Self, Self::Error> {
        if vec_inner_klines.len() < 8 {
            return Err(BNKlineError::InvalidLength);
        }

        let mut items = vec_inner_klines.into_iter();
        let open_timestamp_ms = match items.next().ok_or(BNKlineError::InvalidLength)? {
            KlinesItemInner::Integer(a) => a,
            _ => return Err(BNKlineError::InvalidType("open_time".to_string())),
        };

        let open_price = kline_item_to_float(items.next());
        let high_price = kline_item_to_float(items.next());
        let low_price = kline_item_to_float(items.next());
        let close_price = kline_item_to_float(items.next());
        let base_asset_volume = kline_item_to_float(items.next());
        let _close_time = items.next();
        let quote_asset_volume = kline_item_to_float(items.next());

        Ok(BNKline {
            open_timestamp_ms,
            open_price,
            high_price,
            low_price,
            close_price,
            base_asset_volume,
            quote_asset_volume,
        })
    }
}

fn convert_klines(data: Vec<Vec<KlinesItemInner>>) -> Result<Vec<BNKline>, BNKlineError> {
    data.into_iter().map(Vec::try_into).collect()
}

fn configure_binance_client() -> Result<RestApi> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    Ok(SpotRestApi::production(rest_conf))
}

/// Outcome of merging one page into the accumulated klines.
#[derive(Debug, PartialEq)]
pub(crate) struct PageOutcome {
    /// Open time of the oldest kline in the page; the next request ends here.
    pub next_end_time: Option<i64>,
    pub done: bool,
}

/// Prepend an older page to `all_klines`.
/// Binance treats `end_time` as inclusive, so every page after the first repeats
/// the kline already at the front of `all_klines`; that duplicate is dropped.
pub(crate) fn merge_older_page(
    mut page: Vec<BNKline>,
    page_limit: usize,
    start_ms: i64,
    all_klines: &mut Vec<BNKline>,
) -> PageOutcome {
    let Some(oldest) = page.first().map(|k| k.open_timestamp_ms) else {
        return PageOutcome {
            next_end_time: None,
            done: true,
        };
    };

    let short_page = page.len() < page_limit;

    if let Some(front) = all_klines.first()
        && page
            .last()
            .is_some_and(|k| k.open_timestamp_ms == front.open_timestamp_ms)
    {
        page.pop();
    }

    let added = page.len();
    all_klines.splice(0..0, page);

    PageOutcome {
        next_end_time: Some(oldest),
        done: short_page || added == 0 || oldest <= start_ms,
    }
}

async fn fetch_klines_page(
    rest_client: &RestApi,
    params: KlinesParams,
    pair_interval: &PairInterval,
) -> Result<Vec<Vec<KlinesItemInner>>> {
    match rest_client.klines(params).await {
        Ok(r) => Ok(r.data().await?),
        Err(e) => {
            if let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() {
                match conn_err {
                    connection_error::ConnectorClientError(msg) => {
                        log::error!(
                            "{} Client error: Check your request parameters. {}",
                            pair_interval,
                            msg
                        );
                    }
                    connection_error::TooManyRequestsError(msg) => {
                        log::warn!(
                            "{} Rate limit exceeded. Please wait and try again. {}",
                            pair_interval,
                            msg
                        );
                    }
                    connection_error::RateLimitBanError(msg) => {
                        log::error!(
                            "{} IP address banned due to excessive rate limits. {}",
                            pair_interval,
                            msg
                        );
                    }
                    errors::ConnectorError::ServerError { msg, status_code } => {
                        log::error!(
                            "{} Server error: {} (status code: {:?})",
                            pair_interval,
                            msg,
                            status_code
                        );
                    }
                    errors::ConnectorError::NetworkError(msg) => {
                        log::error!(
                            "{} Network error: Check your internet connection. {}",
                            pair_interval,
                            msg
                        );
                    }
                    errors::ConnectorError::NotFoundError(msg) => {
                        log::error!("Resource not found. {}", msg);
                    }
                    connection_error::BadRequestError(msg) => {
                        log::warn!(
                            "{} Bad request: Verify your input parameters. {}",
                            pair_interval,
                            msg
                        );
                    }
                    other => {
                        log::error!("Unexpected ConnectionError variant: {:?}", other);
                    }
                }
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(conn_err.to_string()))
                        .context(format!("Binance API call failed for {}", pair_interval)),
                )
            } else {
                log::error!(
                    "An unexpected error occurred for {}: {:#}",
                    pair_interval,
                    e
                );
                Err(
                    anyhow::Error::new(BNKlineError::ConnectionFailed(e.to_string())).context(
                        format!("Unexpected error during API call for {}", pair_interval),
                    ),
                )
            }
        }
    }
}

/// Download every kline of `pair_interval` opening at or after `start_ms`.
/// Pages backwards from the latest kline so the newest data is always included.
pub async fn load_klines(
    pair_interval: &PairInterval,
    start_ms: i64,
    limiter: GlobalRateLimiter,
) -> Result<Vec<BNKline>> {
    let rest_client = configure_binance_client()?;
    let page_limit = BINANCE.limits.klines_limit;
    let call_weight = BINANCE.limits.kline_call_weight;

    let mut end_time: Option<i64> = None;
    let mut all_klines: Vec<BNKline> = Vec::new();

    loop {
        limiter.acquire(call_weight, pair_interval.bn_name()).await;

        let params = KlinesParams::builder(
            pair_interval.bn_name().to_string(),
            try_interval_from_ms(pair_interval.interval_ms).map_err(|e| anyhow!(e))?,
        )
        .limit(page_limit)
        .end_time(end_time)
        .build()?;

        let raw = fetch_klines_page(&rest_client, params, pair_interval).await?;
        let page = convert_klines(raw).map_err(|e| {
            anyhow::Error::new(e).context(format!("{} convert_klines failed", pair_interval))
        })?;

        let outcome = merge_older_page(page, page_limit as usize, start_ms, &mut all_klines);

        if DF.log_kline_pages
            && let Some(front) = all_klines.first()
        {
            log::info!(
                "{}: {} klines so far, oldest {}",
                pair_interval,
                all_klines.len(),
                epoch_ms_to_datetime_string(front.open_timestamp_ms)
            );
        }

        end_time = outcome.next_end_time;
        if outcome.done {
            break;
        }
    }

    all_klines.retain(|k| k.open_timestamp_ms >= start_ms);

    if all_klines.is_empty() {
        bail!("Binance returned no klines for {}", pair_interval);
    }
    if has_duplicate_kline_open_time(&all_klines) {
        bail!(
            "has_duplicate_kline_open_time() failed for {} so bailing load_klines()!",
            pair_interval
        );
    }
    Ok(all_klines)
}

fn has_duplicate_kline_open_time(klines: &[BNKline]) -> bool {
    let mut seen_ids = HashSet::new();
    klines.iter().any(|k| !seen_ids.insert(k.open_timestamp_ms))
}

impl From<BNKline> for Candle {
    fn from(bn: BNKline) -> Self {
        Candle::new(
            bn.open_timestamp_ms,
            bn.open_price.unwrap_or_default(),
            bn.high_price.unwrap_or_default(),
            bn.low_price.unwrap_or_default(),
            bn.close_price.unwrap_or_default(),
            bn.base_asset_volume.unwrap_or_default(),
            bn.quote_asset_volume.unwrap_or_default(),
        )
    }
}
