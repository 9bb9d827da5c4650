//! Build lifecycle endpoints.

use bytes::Bytes;
use reqwest::Method;
use serde_json::{Map, Value};

use super::{ConcourseClient, api_error};
use crate::error::ConcourseResult;
use crate::http::{ByteStream, HttpBackend, RequestBody};
use crate::models::BuildDto;
use crate::paths;

impl<B: HttpBackend> ConcourseClient<B> {
    /// Start a build of a job. Parameters, if any, are sent as the JSON body.
    pub async fn create_build(
        &self,
        team: &str,
        pipeline: &str,
        job: &str,
        params: &Map<String, Value>,
    ) -> ConcourseResult<BuildDto> {
        let body = if params.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Json(Bytes::from(serde_json::to_vec(params)?))
        };

        let bytes = self
            .send_expecting(
                Method::POST,
                &paths::job_builds_path(team, pipeline, job)?,
                body,
                &[200, 201],
            )
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get_build(&self, build_id: u64) -> ConcourseResult<BuildDto> {
        self.get_json(&paths::build_path(build_id)).await
    }

    pub async fn abort_build(&self, build_id: u64) -> ConcourseResult<()> {
        self.send_expecting(
            Method::PUT,
            &paths::build_abort_path(build_id),
            RequestBody::Empty,
            &[200, 204],
        )
        .await
        .map(|_| ())
    }

    /// Open the build's event stream; the body is returned unread.
    pub async fn open_events(&self, build_id: u64) -> ConcourseResult<ByteStream> {
        let path = paths::build_events_path(build_id);
        let response = self
            .send(Method::GET, &path, RequestBody::Empty, true)
            .await?;
        if response.status != 200 {
            let status = response.status;
            let body = response.into_bytes().await?;
            return Err(api_error(status, &path, &body));
        }
        Ok(response.body)
    }

    /// The build's execution plan as opaque JSON.
    pub async fn get_build_plan(&self, build_id: u64) -> ConcourseResult<Value> {
        self.get_json(&paths::build_plan_path(build_id)).await
    }

    /// Server info; a cheap authenticated round trip.
    pub async fn info(&self) -> ConcourseResult<Value> {
        self.get_json(paths::INFO_PATH).await
    }
}
