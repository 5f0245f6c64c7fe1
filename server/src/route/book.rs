use application::service::{
    CreateBookService, DeleteBookService, GetBookService, GetBorrowRecordService,
    UpdateBookService,
};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::request::{
    BookTransformer, CreateBookRequest, DeleteBookRequest, GetAllBookRequest,
    GetBookBorrowsRequest, GetBookRequest, GetBooksByAuthorRequest, SearchBookRequest,
    UpdateBookRequest,
};
use crate::response::{AuthorPresenter, BookPresenter, LendingPresenter};

pub trait BookRouter {
    fn route_book(self) -> Self;
}

impl BookRouter for Router<AppModule> {
    fn route_book(self) -> Self {
        self.route(
            "/books",
            get(
                |State(module): State<AppModule>, Query(req): Query<GetAllBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().get_all_books(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>, Json(req): Json<CreateBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().create_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/search",
            get(
                |State(module): State<AppModule>, Query(req): Query<SearchBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.pgpool().get_books_by_title(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/:id",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(GetBookRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 Path(id): Path<i64>,
                 Json(req): Json<UpdateBookRequest>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.pgpool().update_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .delete(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(DeleteBookRequest::new(id))
                        .handle(|dto| async move { module.pgpool().delete_book(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/books/:id/borrows",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(BookTransformer, LendingPresenter)
                        .intake(GetBookBorrowsRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_book_history(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/authors",
            get(|State(module): State<AppModule>| async move {
                Controller::new((), AuthorPresenter)
                    .bypass(|| async move { module.pgpool().get_authors().await })
                    .await
                    .map_err(ErrorStatus::from)
            }),
        )
        .route(
            "/authors/:author/books",
            get(
                |State(module): State<AppModule>, Path(author): Path<String>| async move {
                    Controller::new(BookTransformer, BookPresenter)
                        .intake(GetBooksByAuthorRequest::new(author))
                        .handle(|dto| async move {
                            module.pgpool().get_books_by_author(dto).await
                        })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
