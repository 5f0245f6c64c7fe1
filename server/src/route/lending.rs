use application::service::{CheckoutService, ReturnService};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::request::{CheckoutRequest, LendingTransformer, ReturnRequest};
use crate::response::{CheckoutPresenter, LendingPresenter};

pub trait LendingRouter {
    fn route_lending(self) -> Self;
}

impl LendingRouter for Router<AppModule> {
    fn route_lending(self) -> Self {
        self.route(
            "/checkouts",
            post(
                |State(module): State<AppModule>, Json(req): Json<CheckoutRequest>| async move {
                    Controller::new(LendingTransformer, CheckoutPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().checkout(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/returns",
            post(
                |State(module): State<AppModule>, Json(req): Json<ReturnRequest>| async move {
                    Controller::new(LendingTransformer, LendingPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().return_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
