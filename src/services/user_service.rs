use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    AnonymousId, LoginRequest, RegisterRequest, RepositoryError, ServiceError, ServiceResult,
    User, Validate,
};
use crate::repositories::{ConnectionState, IdCounter, UserRepository};

/// Registration, login and anonymous id issuance
pub struct UserService {
    users: Arc<dyn UserRepository>,
    counter: Arc<dyn IdCounter>,
    users_state: Arc<ConnectionState>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        counter: Arc<dyn IdCounter>,
        users_state: Arc<ConnectionState>,
    ) -> Self {
        Self {
            users,
            counter,
            users_state,
        }
    }

    /// Issue the next `anonymous-<n>` id
    #[instrument(skip(self))]
    pub async fn unique_id(&self) -> ServiceResult<AnonymousId> {
        let value = self.counter.next_id().await?;
        Ok(AnonymousId::from_counter(value))
    }

    /// Succeeds if a user with this name is registered
    #[instrument(skip(self))]
    pub async fn check(&self, name: &str) -> ServiceResult<()> {
        self.ensure_connected()?;
        self.find(name).await.map(|_| ())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn login(&self, request: &LoginRequest) -> ServiceResult<User> {
        request.validate()?;
        self.ensure_connected()?;

        let user = self.find(&request.name).await?;
        if user.password != request.password {
            return Err(ServiceError::IncorrectPassword);
        }

        info!("User logged in");
        Ok(user)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<()> {
        request.validate()?;
        self.ensure_connected()?;

        let user = User::from(request);

        if self.users.find_by_name(&user.name).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists { name: user.name });
        }

        // A concurrent registration can still win between the read and the write
        match self.users.create(&user).await {
            Ok(()) => {
                info!("User registered");
                Ok(())
            }
            Err(RepositoryError::ConstraintViolation { .. }) => {
                Err(ServiceError::UserAlreadyExists { name: user.name })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Names are stored trimmed, so lookups trim too
    async fn find(&self, name: &str) -> ServiceResult<User> {
        let name = name.trim();
        self.users
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                name: name.to_string(),
            })
    }

    fn ensure_connected(&self) -> ServiceResult<()> {
        if self.users_state.is_connected() {
            Ok(())
        } else {
            Err(ServiceError::StoreUnavailable)
        }
    }
}
