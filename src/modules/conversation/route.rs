use crate::modules::conversation::handle::*;
use crate::modules::message::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations")
            .service(resolve_conversation)
            .service(send_message)
            .service(get_messages)
            .service(get_conversation),
    );
}
