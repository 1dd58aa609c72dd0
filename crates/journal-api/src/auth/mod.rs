//! 인증 및 권한 부여.
//!
//! JWT 기반 인증을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체
//! - [`JwtAuth`]: Axum 미들웨어용 JWT 검증 추출기
//! - 토큰 생성/검증 및 비밀번호 해싱 함수
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! // 보호된 라우트에서 JwtAuth 추출기 사용
//! async fn protected_handler(
//!     JwtAuth(claims): JwtAuth,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.username)
//! }
//! ```

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_token, decode_token, issue_access_token, AccessToken, Claims, JwtError};
pub use middleware::{JwtAuth, JwtAuthError};
pub use password::{
    hash_password, validate_password_strength, verify_password, PasswordError,
};
