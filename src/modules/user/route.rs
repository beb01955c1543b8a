use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/users")
            .service(create_profile)
            .service(get_profile)
            .service(search_users)
            .service(get_user),
    );
}
