use crate::modules::friend::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(get_incoming_requests)
            .service(send_request)
            .service(accept_request)
            .service(decline_request)
            .service(get_friends),
    );
}
