use super::{Notice, layout};
use crate::models::Role;
use maud::{Markup, html};

pub fn login_page(mode: Role, username: &str, notice: Option<&Notice>) -> Markup {
    let (title, hint) = match mode {
        Role::Admin => ("관리자 로그인", "관리자 계정으로 로그인하세요."),
        Role::Member => ("회원 로그인", "회원 계정으로 로그인하세요."),
    };
    let content = html! {
        section.card.login {
            h1 { "FitLady" }
            div.mode-tabs {
                a.selected[mode == Role::Member] href="/?mode=member" { "회원" }
                a.selected[mode == Role::Admin] href="/?mode=admin" { "관리자" }
            }
            h2 { (title) }
            p { (hint) }
            form method="post" action="/login" style="display:grid;gap:12px" {
                input type="hidden" name="mode" value=(mode.as_str());
                label {
                    "아이디"
                    input type="text" name="username" value=(username) autocomplete="username";
                }
                label {
                    "비밀번호"
                    input type="password" name="password" autocomplete="current-password";
                }
                label style="display:flex;gap:6px;align-items:center" {
                    input type="checkbox" name="remember_me" value="true";
                    "로그인 상태 유지"
                }
                button type="submit" { "로그인" }
            }
        }
    };
    layout(title, None, notice, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_mode_is_highlighted_and_posted() {
        let page = login_page(Role::Admin, "admin", None).into_string();
        assert!(page.contains("관리자 로그인"));
        assert!(page.contains(r#"name="mode" value="admin""#));
        assert!(page.contains(r#"value="admin" autocomplete="username""#));
        assert_eq!(page.matches(r#"class="selected""#).count(), 1);
    }
}
