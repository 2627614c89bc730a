//! `HttpClient` over the browser fetch API, usable from a window or a worker.

use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, Window, WorkerGlobalScope};

#[derive(Debug, Default, Clone, Copy)]
pub struct FetchClient;

impl HttpClient for FetchClient {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, HttpError>> {
        fetch(request).boxed_local()
    }
}

fn js_error(value: JsValue) -> HttpError {
    HttpError::Network(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

async fn fetch(request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    if let Some(body) = &request.body {
        init.set_body(&JsValue::from_str(body));
    }

    let js_request = Request::new_with_str_and_init(&request.url, &init).map_err(js_error)?;
    for (name, value) in &request.headers {
        js_request.headers().set(name, value).map_err(js_error)?;
    }

    let global = js_sys::global();
    let promise = if let Some(window) = global.dyn_ref::<Window>() {
        window.fetch_with_request(&js_request)
    } else if let Some(scope) = global.dyn_ref::<WorkerGlobalScope>() {
        scope.fetch_with_request(&js_request)
    } else {
        return Err(HttpError::Unsupported);
    };

    let response: Response = JsFuture::from(promise)
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let status = response.status();
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;

    Ok(HttpResponse {
        status,
        body: text.as_string().unwrap_or_default(),
    })
}
