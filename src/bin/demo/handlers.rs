/*
 * Responsibility
 * - Demo endpoints that present what the JWT middleware put in the request context
 */
use axum::response::Html;
use jwt_handler::{
    AuthContext, AuthError, signed_token_from_context, subject_from_token, token_from_context,
};

pub async fn index() -> Html<&'static str> {
    Html(
        r#"<html>
    <head>
        <title>index</title>
    </head>
    <body>
        <form method="post" action="/login">
            <input type="text" name="username" />
            <input type="password" name="password" />
            <input type="submit" value="login" />
        </form>
    </body>
</html>
"#,
    )
}

// curl -F 'username=admin' -F 'password=admin' http://localhost:8080/login
// (or -d for an urlencoded form)
pub async fn login(AuthContext(ctx): AuthContext) -> Result<String, AuthError> {
    let token = signed_token_from_context(&ctx).ok_or(AuthError::MissingToken)?;
    Ok(format!("Your token is {token}"))
}

// curl -H 'Authorization: Bearer <token>' http://localhost:8080/hello
pub async fn hello(AuthContext(ctx): AuthContext) -> Result<String, AuthError> {
    let claims = token_from_context(&ctx).ok_or(AuthError::MissingToken)?;
    let name = subject_from_token(claims).ok_or(AuthError::MissingToken)?;
    Ok(format!("Your name is {name}"))
}

// curl -H 'Authorization: Bearer <token>' http://localhost:8080/refresh
pub async fn refresh(AuthContext(ctx): AuthContext) -> Result<String, AuthError> {
    let token = signed_token_from_context(&ctx).ok_or(AuthError::MissingToken)?;
    Ok(format!("Your new token is {token}"))
}
