//! HTTP endpoint receiving GitHub webhook deliveries and relaying them to the dispatchers.

/// State shared by all concurrently handled requests. Nothing in it is modified after startup.
#[derive(Clone)]
pub struct Context
{
	pub dispatchers: std::sync::Arc<crate::dispatchers::Dispatchers>,
	/// Used to look up the display names of users. Without a client, logins are used instead.
	pub github_api_client: Option<crate::github_api::Client>,
}

/// All routes of the webhook server, including rejection handling and request logging.
pub fn routes(context: Context)
	-> impl warp::Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone
{
	use warp::Filter as _;

	let health_route =
		warp::path::end()
		.and(warp::get())
		.map(|| warp::reply::json(&MessageResponse{message: "ok"}));

	let github_event_route =
		warp::path!("v1" / "github")
		// Only listen for POST requests
		.and(warp::post())
		// Missing headers are reported together in the handler rather than rejected here
		.and(warp::header::optional::<String>("x-github-event"))
		.and(warp::header::optional::<String>("x-github-delivery"))
		// Reject payloads larger than 256 kB, which should be enough for all valid requests
		.and(warp::body::content_length_limit(256 * 1024))
		.and(warp::body::bytes())
		.and(warp::any().map(move || context.clone()))
		.and_then(handle_github_event);

	health_route
		.or(github_event_route)
		.recover(handle_rejection)
		.with(warp::log::custom(|info|
		{
			// Don’t flood the log with health checks
			if info.path() == "/" && info.status().is_success()
			{
				return;
			}

			let event_kind = info.request_headers().get("x-github-event")
				.and_then(|value| value.to_str().ok())
				.unwrap_or("-");

			log::info!("{} {} {} (event: {event_kind}, {:?})", info.method(), info.path(),
				info.status().as_u16(), info.elapsed());
		}))
}

/// Request handler for webhook deliveries.
///
/// # Arguments
/// - `event_kind`: The value of the `X-GitHub-Event` header.
/// - `delivery_id`: The value of the `X-GitHub-Delivery` header.
/// - `body`: The raw JSON payload.
/// - `context`: The state shared between requests.
async fn handle_github_event(
	event_kind: Option<String>,
	delivery_id: Option<String>,
	body: warp::hyper::body::Bytes,
	context: Context)
	-> Result<warp::reply::Response, std::convert::Infallible>
{
	use warp::Reply as _;

	let mut reasons = Vec::new();

	if event_kind.is_none()
	{
		reasons.push("missing X-GitHub-Event header".to_string());
	}

	if delivery_id.is_none()
	{
		reasons.push("missing X-GitHub-Delivery header".to_string());
	}

	let (event_kind, delivery_id) = match (event_kind, delivery_id)
	{
		(Some(event_kind), Some(delivery_id)) => (event_kind, delivery_id),
		_ =>
		{
			log::warn!("rejecting webhook delivery: {}", reasons.join(", "));
			return Ok(reason_response(warp::http::StatusCode::BAD_REQUEST, &reasons));
		},
	};

	let event = match crate::webhook_events::WebhookEvent::classify(&event_kind, &body)
	{
		Ok(crate::webhook_events::Classification::Event(event)) => event,
		Ok(crate::webhook_events::Classification::Skip(reason)) =>
		{
			if let crate::webhook_events::SkipReason::Unknown(_) = reason
			{
				log::info!("ignoring delivery {delivery_id} of {reason} (supported kinds: {})",
					crate::webhook_events::SUPPORTED_KINDS.join(", "));
			}
			else
			{
				log::debug!("ignoring delivery {delivery_id} of {reason}");
			}

			return Ok(warp::http::StatusCode::NO_CONTENT.into_response());
		},
		Err(error) =>
		{
			let reason = error.chain();

			log::warn!("rejecting malformed delivery {delivery_id}");
			log::warn!("{:?}", anyhow::Error::from(error));

			return Ok(reason_response(warp::http::StatusCode::BAD_REQUEST, &[reason]));
		},
	};

	for warning in event.warnings()
	{
		log::warn!("{event_kind} delivery {delivery_id}: {warning}");
	}

	let summary = event.summary();

	if summary.is_empty()
	{
		log::debug!("not relaying {event_kind} delivery {delivery_id}");
		return Ok(warp::http::StatusCode::NO_CONTENT.into_response());
	}

	let display_name = crate::github_api::resolve_display_name(
		context.github_api_client.as_ref(), event.username()).await;
	let message = format!("{display_name} {summary}");

	match context.dispatchers.process_message(event.repository(), &message).await
	{
		Ok(()) =>
		{
			log::info!("relayed {event_kind} delivery {delivery_id} for repository “{}”",
				event.repository());
			Ok(warp::http::StatusCode::NO_CONTENT.into_response())
		},
		Err(error @ crate::Error::NoDispatcher(_)) =>
		{
			log::warn!("{error}");
			Ok(reason_response(warp::http::StatusCode::BAD_REQUEST, &[error.chain()]))
		},
		Err(error) =>
		{
			let reason = error.chain();

			log::error!("could not relay {event_kind} delivery {delivery_id}");
			log::error!("{:?}", anyhow::Error::from(error));

			Ok(reason_response(warp::http::StatusCode::INTERNAL_SERVER_ERROR, &[reason]))
		},
	}
}

/// Request handler for all requests that were rejected previously.
///
/// # Arguments
/// - `error`: Reasons for why this request was rejected by all routes.
async fn handle_rejection(error: warp::Rejection)
	-> Result<warp::reply::Response, std::convert::Infallible>
{
	let status_code;
	let reason;

	if error.is_not_found()
	{
		status_code = warp::http::StatusCode::NOT_FOUND;
		reason = "not found";
	}
	else if let Some(_) = error.find::<warp::reject::MethodNotAllowed>()
	{
		status_code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
		reason = "method not allowed";
	}
	else if let Some(_) = error.find::<warp::reject::PayloadTooLarge>()
	{
		status_code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
		reason = "payload too large";
	}
	else if let Some(_) = error.find::<warp::reject::LengthRequired>()
	{
		status_code = warp::http::StatusCode::LENGTH_REQUIRED;
		reason = "missing content length";
	}
	// If users are able to trigger errors we did not anticipate, log the error so we can inspect
	// this more closely later
	else
	{
		status_code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
		reason = "internal server error";

		log::error!("unhandled error: {:#?}", error);
	}

	Ok(reason_response(status_code, &[reason.to_string()]))
}

/// Build a JSON response with one `reason` entry per reason.
///
/// The entries share the same key, which `serde_json` can’t produce from a map, so the object is
/// assembled by hand from individually encoded strings.
#[doc(hidden)]
fn reason_response(status_code: warp::http::StatusCode, reasons: &[String])
	-> warp::reply::Response
{
	use warp::Reply as _;

	let entries = reasons.iter()
		.map(|reason| format!("\"reason\":{}", serde_json::Value::from(reason.as_str())))
		.collect::<Vec<_>>();
	let body = format!("{{{}}}", entries.join(","));

	let response = warp::reply::with_header(body, "content-type", "application/json");

	warp::reply::with_status(response, status_code).into_response()
}

/// Response type of the health check (serialized to JSON).
#[derive(serde::Serialize)]
struct MessageResponse<'a>
{
	message: &'a str,
}
