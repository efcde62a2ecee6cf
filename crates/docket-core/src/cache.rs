use std::collections::HashMap;
use std::future::Future;

use anyhow::Context;
use chrono::{
  DateTime,
  Duration,
  Utc
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{
  debug,
  instrument
};

/// Collections the client caches, keyed by
/// their resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Tasks,
  Cases,
  Matters,
  Employees
}

impl Resource {
  pub fn key(self) -> &'static str {
    match self {
      | Resource::Tasks => "tasks",
      | Resource::Cases => "cases",
      | Resource::Matters => "matters",
      | Resource::Employees => "employees"
    }
  }
}

#[derive(Debug, Clone)]
struct CacheEntry {
  value:      Value,
  fetched_at: DateTime<Utc>,
  stale:      bool
}

/// Fetched collections by resource name.
/// Owned by whoever drives the fetches and
/// passed around explicitly.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
  entries: HashMap<&'static str, CacheEntry>,
  max_age: Option<Duration>
}

impl QueryCache {
  /// `max_age_secs == 0` keeps entries until
  /// they are invalidated.
  pub fn new(max_age_secs: u64) -> Self {
    Self {
      entries: HashMap::new(),
      max_age: (max_age_secs > 0).then(|| {
        Duration::try_seconds(
          i64::try_from(max_age_secs)
            .unwrap_or(i64::MAX)
        )
        .unwrap_or(Duration::MAX)
      })
    }
  }

  pub fn is_fresh(
    &self,
    resource: Resource,
    now: DateTime<Utc>
  ) -> bool {
    self
      .entries
      .get(resource.key())
      .is_some_and(|entry| {
        !entry.stale
          && self.max_age.is_none_or(|age| {
            now - entry.fetched_at < age
          })
      })
  }

  pub fn get<T>(
    &self,
    resource: Resource
  ) -> anyhow::Result<Option<T>>
  where
    T: DeserializeOwned
  {
    let Some(entry) =
      self.entries.get(resource.key())
    else {
      return Ok(None);
    };
    serde_json::from_value(
      entry.value.clone()
    )
    .map(Some)
    .with_context(|| {
      format!(
        "cached {} has an unexpected \
         shape",
        resource.key()
      )
    })
  }

  pub fn put<T>(
    &mut self,
    resource: Resource,
    value: &T,
    now: DateTime<Utc>
  ) -> anyhow::Result<()>
  where
    T: Serialize
  {
    let value = serde_json::to_value(value)
      .with_context(|| {
        format!(
          "failed to cache {}",
          resource.key()
        )
      })?;
    self.entries.insert(
      resource.key(),
      CacheEntry {
        value,
        fetched_at: now,
        stale: false
      }
    );
    Ok(())
  }

  /// Marks an entry stale so the next
  /// `fetch` reloads it. Returns whether an
  /// entry existed.
  #[instrument(skip(self), fields(key = resource.key()))]
  pub fn invalidate(
    &mut self,
    resource: Resource
  ) -> bool {
    match self.entries.get_mut(resource.key())
    {
      | Some(entry) => {
        entry.stale = true;
        debug!("invalidated cache entry");
        true
      }
      | None => false
    }
  }

  /// Returns the cached value when fresh,
  /// otherwise awaits `loader` and caches
  /// its result. A failed load leaves the
  /// previous entry untouched.
  #[instrument(skip(self, loader), fields(key = resource.key()))]
  pub async fn fetch<T, F, Fut>(
    &mut self,
    resource: Resource,
    loader: F
  ) -> anyhow::Result<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>
  {
    if self.is_fresh(resource, Utc::now())
      && let Some(value) = self.get(resource)?
    {
      debug!("cache hit");
      return Ok(value);
    }

    debug!("cache miss; loading");
    let value = loader().await?;
    self.put(resource, &value, Utc::now())?;
    Ok(value)
  }
}
