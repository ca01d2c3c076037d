//! gRPC handlers for the template service.

use tonic::{Request, Response, Status};

use stencil_core::api::{API_VERSION, check_version};

use crate::error::ServiceError;
use crate::proto::v1::template_service_server::TemplateService;
use crate::proto::v1::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ListRequest, ListResponse,
    ReadRequest, ReadResponse, UpdateRequest, UpdateResponse,
};
use crate::repository::TemplateRepository;

/// Stateless handler: checks the API version, then delegates to the repository.
pub struct TemplateApi {
    repository: TemplateRepository,
}

impl TemplateApi {
    pub fn new(repository: TemplateRepository) -> Self {
        Self { repository }
    }
}

fn api_version() -> String {
    API_VERSION.to_string()
}

fn count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[tonic::async_trait]
impl TemplateService for TemplateApi {
    async fn create(
        &self,
        request: Request<CreateRequest>,
    ) -> Result<Response<CreateResponse>, Status> {
        let req = request.into_inner();
        check_version(&req.api).map_err(ServiceError::from)?;

        // Only the items are taken from the caller; id and timestamps are ours.
        let items = req.template.map(|t| t.items).unwrap_or_default();
        let template = self
            .repository
            .create(items)
            .await
            .map_err(ServiceError::from)?;

        Ok(Response::new(CreateResponse {
            api: api_version(),
            id: template.id,
        }))
    }

    async fn read(&self, request: Request<ReadRequest>) -> Result<Response<ReadResponse>, Status> {
        let req = request.into_inner();
        check_version(&req.api).map_err(ServiceError::from)?;

        let template = self
            .repository
            .read(&req.id)
            .await
            .map_err(ServiceError::from)?;

        Ok(Response::new(ReadResponse {
            api: api_version(),
            template: Some(template.into()),
        }))
    }

    async fn update(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<UpdateResponse>, Status> {
        let req = request.into_inner();
        check_version(&req.api).map_err(ServiceError::from)?;

        let template = req.template.unwrap_or_default();
        let updated = self
            .repository
            .update(&template.id, template.items)
            .await
            .map_err(ServiceError::from)?;

        Ok(Response::new(UpdateResponse {
            api: api_version(),
            updated: count(updated),
        }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let req = request.into_inner();
        check_version(&req.api).map_err(ServiceError::from)?;

        let deleted = self
            .repository
            .delete(&req.id)
            .await
            .map_err(ServiceError::from)?;

        Ok(Response::new(DeleteResponse {
            api: api_version(),
            deleted: count(deleted),
        }))
    }

    async fn list(&self, request: Request<ListRequest>) -> Result<Response<ListResponse>, Status> {
        let req = request.into_inner();
        check_version(&req.api).map_err(ServiceError::from)?;

        let templates = self.repository.list().await.map_err(ServiceError::from)?;

        Ok(Response::new(ListResponse {
            api: api_version(),
            templates: templates.into_iter().map(Into::into).collect(),
        }))
    }
}
