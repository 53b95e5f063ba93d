//! Cached access to every dashboard resource.
//!
//! [`Dashboard`] binds a [`DashboardClient`] to a shared [`QueryCache`], so
//! every view that asks for the same resource shares one fetch and one cached
//! result.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::{QueryCache, QueryState, Subscription};
use crate::client::{DashboardClient, Resource, ResourceKey};
use crate::error::FetchError;
use crate::model::{Appointment, ChartData, Metrics, Patient};

/// Row limit used by the "recent" widgets on the overview page.
pub const RECENT_LIMIT: u32 = 4;

/// States of everything the overview page renders.
///
/// Each field settles on its own; one failed resource never hides the others.
#[derive(Debug, Clone)]
pub struct Overview {
    pub metrics: QueryState<Metrics>,
    pub charts: QueryState<ChartData>,
    pub appointments: QueryState<Vec<Appointment>>,
    pub patients: QueryState<Vec<Patient>>,
}

impl Overview {
    /// True once every resource has either data or an error.
    pub fn is_settled(&self) -> bool {
        !self.metrics.is_loading()
            && !self.charts.is_loading()
            && !self.appointments.is_loading()
            && !self.patients.is_loading()
    }

    pub fn errors(&self) -> Vec<(Resource, &FetchError)> {
        [
            (Resource::Metrics, self.metrics.error.as_ref()),
            (Resource::Charts, self.charts.error.as_ref()),
            (Resource::Appointments, self.appointments.error.as_ref()),
            (Resource::Patients, self.patients.error.as_ref()),
        ]
        .into_iter()
        .filter_map(|(resource, error)| error.map(|e| (resource, e)))
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    cache: Arc<QueryCache>,
    client: DashboardClient,
}

impl Dashboard {
    pub fn new(client: DashboardClient, cache: Arc<QueryCache>) -> Self {
        Self { cache, client }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }

    async fn load<T>(&self, key: ResourceKey, force: bool) -> QueryState<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let client = self.client.clone();
        let fetch = move || async move { client.get::<T>(&key).await };
        if force {
            self.cache.refetch(key, fetch).await
        } else {
            self.cache.query(key, fetch).await
        }
    }

    pub async fn patients(&self, limit: Option<u32>) -> QueryState<Vec<Patient>> {
        self.load(ResourceKey::new(Resource::Patients).with_limit(limit), false)
            .await
    }

    pub async fn appointments(&self, limit: Option<u32>) -> QueryState<Vec<Appointment>> {
        self.load(ResourceKey::new(Resource::Appointments).with_limit(limit), false)
            .await
    }

    pub async fn metrics(&self) -> QueryState<Metrics> {
        self.load(Resource::Metrics.into(), false).await
    }

    pub async fn charts(&self) -> QueryState<ChartData> {
        self.load(Resource::Charts.into(), false).await
    }

    pub async fn refresh_patients(&self, limit: Option<u32>) -> QueryState<Vec<Patient>> {
        self.load(ResourceKey::new(Resource::Patients).with_limit(limit), true)
            .await
    }

    pub async fn refresh_appointments(&self, limit: Option<u32>) -> QueryState<Vec<Appointment>> {
        self.load(ResourceKey::new(Resource::Appointments).with_limit(limit), true)
            .await
    }

    pub async fn refresh_metrics(&self) -> QueryState<Metrics> {
        self.load(Resource::Metrics.into(), true).await
    }

    pub async fn refresh_charts(&self) -> QueryState<ChartData> {
        self.load(Resource::Charts.into(), true).await
    }

    pub fn subscribe_patients(&self, limit: Option<u32>) -> Subscription<Vec<Patient>> {
        self.cache
            .subscribe(ResourceKey::new(Resource::Patients).with_limit(limit))
    }

    pub fn subscribe_appointments(&self, limit: Option<u32>) -> Subscription<Vec<Appointment>> {
        self.cache
            .subscribe(ResourceKey::new(Resource::Appointments).with_limit(limit))
    }

    /// Loads the overview page: metrics, charts and the recent lists,
    /// concurrently.
    pub async fn overview(&self) -> Overview {
        let (metrics, charts, appointments, patients) = tokio::join!(
            self.metrics(),
            self.charts(),
            self.appointments(Some(RECENT_LIMIT)),
            self.patients(Some(RECENT_LIMIT)),
        );

        let overview = Overview {
            metrics,
            charts,
            appointments,
            patients,
        };
        for (resource, error) in overview.errors() {
            tracing::warn!(
                %resource,
                category = %error.category(),
                error = %error,
                "Overview resource failed"
            );
        }
        overview
    }
}
