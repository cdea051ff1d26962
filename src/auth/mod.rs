pub mod code;
pub mod oauth;
pub mod reauth;
pub mod token;
pub mod token_store;

pub use code::extract_authorization_code;
pub use oauth::{Credentials, OAuthEndpoints, OAuthTokenManager, TokenState, build_authorization_url};
pub use reauth::{ChannelReauthNotifier, LogReauthNotifier, ReauthNotifier, ReauthRequest};
pub use token::TokenSet;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
