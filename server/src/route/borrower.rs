use application::service::{GetBorrowRecordService, GetBorrowerService, RegisterBorrowerService};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::request::{
    BorrowerTransformer, BorrowsScope, GetAllBorrowerRequest, GetBorrowerRequest,
    GetBorrowsRequest, RegisterBorrowerRequest, SearchBorrowerRequest,
};
use crate::response::{BorrowerPresenter, LendingPresenter};

pub trait BorrowerRouter {
    fn route_borrower(self) -> Self;
}

impl BorrowerRouter for Router<AppModule> {
    fn route_borrower(self) -> Self {
        self.route(
            "/borrowers",
            get(
                |State(module): State<AppModule>, Query(req): Query<GetAllBorrowerRequest>| async move {
                    Controller::new(BorrowerTransformer, BorrowerPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().get_all_borrowers(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>, Json(req): Json<RegisterBorrowerRequest>| async move {
                    Controller::new(BorrowerTransformer, BorrowerPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().register_borrower(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowers/search",
            get(
                |State(module): State<AppModule>, Query(req): Query<SearchBorrowerRequest>| async move {
                    Controller::new(BorrowerTransformer, BorrowerPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().get_borrower_by_email(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowers/:id",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(BorrowerTransformer, BorrowerPresenter)
                        .intake(GetBorrowerRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_borrower(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/borrowers/:id/borrows",
            get(
                |State(module): State<AppModule>,
                 Path(id): Path<i64>,
                 Query(req): Query<GetBorrowsRequest>| async move {
                    Controller::new(BorrowerTransformer, LendingPresenter)
                        .intake((id, req))
                        .handle(|scope| async move {
                            match scope {
                                BorrowsScope::Open(dto) => {
                                    module.pgpool().get_open_borrows(dto).await
                                }
                                BorrowsScope::History(dto) => {
                                    module.pgpool().get_borrow_history(dto).await
                                }
                            }
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
